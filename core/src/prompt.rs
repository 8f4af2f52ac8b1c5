//! Prompts sent to the judge, and the canned lines the host speaks itself.

use alloc::format;
use alloc::vec::Vec;

use crate::{ChatMessage, Puzzle};

pub const WELCOME_MESSAGE: &str =
    "謎題已出。請閱讀題目，透過提問來猜出這個「詞」是什麼。你的時間只有 3 分鐘。";

pub const JUDGE_UNAVAILABLE: &str = "裁判去上廁所了... (系統錯誤，請重試)";

pub const REPLY_YES: &str = "是";
pub const REPLY_NO: &str = "不是";
pub const REPLY_UNRELATED: &str = "沒有關係";
pub const REPLY_SOLVED: &str = "恭喜答對！";

const GENERATION_RULES: &str = r#"我們來玩「猜詞遊戲」：玩家只能用是非題提問，目標是猜出一個具體的名詞。
請出一道繁體中文的謎題，包含以下三個欄位：
1. title：這個名詞的類別，例如動物、日常用品、職業、水果、交通工具。
2. content：一段描述這個名詞的神秘文字，可以擬人化或使用隱喻，但絕對不能出現答案本身。
3. answer：答案名詞，例如蘋果、消防員、時鐘。

只回傳 JSON，不要任何其他文字，格式如下：
{"title": "類別", "content": "描述內容", "answer": "目標名詞"}"#;

const GENERATION_REQUEST: &str = "請出一道新的猜詞題目，輸出必須是合法的 JSON。";

/// Messages asking the judge for a fresh [`Puzzle`].
pub fn generation_messages() -> Vec<ChatMessage> {
    alloc::vec![
        ChatMessage::system(GENERATION_RULES),
        ChatMessage::user(GENERATION_REQUEST),
    ]
}

/// Messages asking the judge to rule on one player question or guess.
pub fn judgment_messages(puzzle: &Puzzle, question: &str) -> Vec<ChatMessage> {
    let Puzzle {
        content, answer, ..
    } = puzzle;

    let rules = format!(
        r#"你是「猜詞遊戲」的主持人。
題目：{content}
正確答案（目標名詞）：{answer}

玩家剛剛提出的問題或猜測："{question}"

規則：
1. reply 只能是「{REPLY_YES}」、「{REPLY_NO}」或「{REPLY_UNRELATED}」。
2. 如果玩家猜中了目標名詞（{answer}），reply 為「{REPLY_SOLVED}」，並將 solved 設為 true。
3. 如果玩家猜了錯誤的名詞，reply 為「{REPLY_NO}」。
4. 如果玩家詢問特徵（例如：是紅色的嗎？），依照正確答案回答「{REPLY_YES}」或「{REPLY_NO}」。"#
    );

    alloc::vec![
        ChatMessage::system(rules),
        ChatMessage::user(r#"請依照規則回傳 JSON 判斷結果，格式為 {"reply": "...", "solved": boolean}"#),
    ]
}
