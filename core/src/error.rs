use alloc::format;
use alloc::string::String;
use caici_protocol::FormatError;
use thiserror::Error;

/// Rejected session transitions. A rejected call leaves the session untouched.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A puzzle is already being generated or played")]
    RoundInFlight,
    #[error("No round is being played")]
    NotPlaying,
    #[error("Guess is empty")]
    EmptyGuess,
    #[error("The judge is still answering the previous guess")]
    JudgeBusy,
    #[error("The puzzle is already solved")]
    AlreadySolved,
    #[error("Result belongs to a round that is no longer current")]
    StaleRound,
}

pub type Result<T> = core::result::Result<T, SessionError>;

/// Failures of a round's external dependencies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("API key is missing")]
    MissingApiKey,
    #[error("Judge request failed: {0}")]
    Transport(String),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl RoundError {
    /// Message for the blocking notice shown to the player.
    pub fn notice(&self) -> String {
        match self {
            Self::MissingApiKey => "請輸入 API Key".into(),
            Self::Transport(message) => {
                format!("連線錯誤：{message}\n請檢查 API Key 是否有效或網路連線。")
            }
            Self::Format(FormatError::AnswerLeaked) => "生成的題目洩漏了答案，請重新出題。".into(),
            Self::Format(_) => "生成的題目格式有誤，請重試。".into(),
        }
    }
}
