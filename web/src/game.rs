use crate::gateway::JudgeGateway;
use crate::utils::*;
use caici_core::{
    JudgeConfig, JudgeRequest, Role, RoundError, RoundId, RoundResult, RoundStart, Session,
    SessionState, TickOutcome, VerdictOutcome, WIN_REVEAL_DELAY_MS,
};
use clap::Args;
use gloo::timers::callback::{Interval, Timeout};
use web_sys::HtmlInputElement;
use yew::prelude::*;

const GENERATING_MESSAGE: &str = "正在尋找謎題... (生成中)";

const RULES: &[&str] = &[
    "AI 會描述一個名詞（可能是物品、動物等）。",
    "你只能問「是／否」類型的問題。",
    "目標是猜出那個「詞」是什麼。",
    "限時 3 分鐘。",
];

type Completion = Result<String, RoundError>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    ApiKeyInput(String),
    StartRound,
    PuzzleSettled(RoundId, Completion),
    GuessInput(String),
    SubmitGuess,
    VerdictSettled(RoundId, Completion),
    GiveUp,
    Tick,
    DeclareWin(RoundId),
}

fn headline(result: RoundResult) -> &'static str {
    use RoundResult::*;
    match result {
        Win => "恭喜答對！",
        GiveUp => "已放棄挑戰",
        Lose => "時間到，挑戰失敗",
    }
}

/// Text shown in the API key field, so it always mirrors the configured key.
fn api_key_value(config: &JudgeConfig) -> String {
    config.api_key().to_owned()
}

fn result_class(result: RoundResult) -> &'static str {
    use RoundResult::*;
    match result {
        Win => "win",
        GiveUp => "giveup",
        Lose => "lose",
    }
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Chat-completion endpoint used as the judge
    #[arg(long, default_value = caici_core::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[arg(long, default_value = caici_core::DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = caici_core::DEFAULT_TEMPERATURE)]
    pub temperature: f32,
}

#[derive(Debug)]
pub(crate) struct GameView {
    session: Session,
    config: JudgeConfig,
    guess: String,
    countdown: Option<Interval>,
    win_reveal: Option<Timeout>,
}

impl GameView {
    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(1_000, move || link.send_message(Msg::Tick))
    }

    /// Keeps the one-second interval alive exactly while the clock may run.
    fn sync_countdown(&mut self, ctx: &Context<Self>) {
        let running = self.session.state().is_playing() && !self.session.is_solved();
        match (running, self.countdown.is_some()) {
            (true, false) => {
                log::debug!("countdown started");
                self.countdown = Some(Self::create_timer(ctx));
            }
            (false, true) => {
                log::debug!("countdown cancelled");
                self.countdown = None;
            }
            _ => {}
        }
    }

    fn ask_judge(
        &self,
        ctx: &Context<Self>,
        request: JudgeRequest,
        settle: fn(RoundId, Completion) -> Msg,
    ) {
        let gateway = JudgeGateway::new(self.config.clone());
        let JudgeRequest { round, messages } = request;
        ctx.link().send_future(async move {
            let completion = gateway
                .ask(&messages, true)
                .await
                .map_err(RoundError::from);
            settle(round, completion)
        });
    }

    fn start_round(&mut self, ctx: &Context<Self>) -> bool {
        if let Err(err) = self.config.validate() {
            notify(&err);
            return false;
        }

        match self.session.begin_round() {
            Ok(request) => {
                self.win_reveal = None;
                self.guess.clear();
                self.ask_judge(ctx, request, Msg::PuzzleSettled);
                true
            }
            Err(err) => {
                log::debug!("start round ignored: {}", err);
                false
            }
        }
    }

    fn submit_guess(&mut self, ctx: &Context<Self>) -> bool {
        match self.session.submit_guess(&self.guess) {
            Ok(request) => {
                self.guess.clear();
                self.ask_judge(ctx, request, Msg::VerdictSettled);
                true
            }
            Err(err) => {
                log::debug!("guess ignored: {}", err);
                false
            }
        }
    }

    fn settle_puzzle(&mut self, round: RoundId, completion: Completion) -> bool {
        match self.session.generation_settled(round, completion) {
            Ok(RoundStart::Playing) => true,
            Ok(RoundStart::Aborted(err)) => {
                notify(&err);
                true
            }
            Err(err) => {
                log::debug!("{}: generation result dropped: {}", round, err);
                false
            }
        }
    }

    fn settle_verdict(&mut self, ctx: &Context<Self>, round: RoundId, completion: Completion) -> bool {
        match self.session.verdict_settled(round, completion) {
            Ok(VerdictOutcome::Solved) => {
                let link = ctx.link().clone();
                self.win_reveal = Some(Timeout::new(WIN_REVEAL_DELAY_MS, move || {
                    link.send_message(Msg::DeclareWin(round))
                }));
                true
            }
            Ok(VerdictOutcome::Unavailable(err)) => {
                notify(&err);
                true
            }
            Ok(VerdictOutcome::Answered | VerdictOutcome::Degraded(_)) => true,
            Err(err) => {
                log::debug!("{}: verdict dropped: {}", round, err);
                // the in-flight flag may still have been cleared
                true
            }
        }
    }

    fn view_welcome(&self, ctx: &Context<Self>) -> Html {
        let cb_api_key = ctx.link().callback(|e: InputEvent| {
            Msg::ApiKeyInput(e.target_unchecked_into::<HtmlInputElement>().value())
        });
        let cb_start = ctx.link().callback(|_: MouseEvent| Msg::StartRound);

        html! {
            <div class="caici welcome">
                <article>
                    <header>
                        <h1>{"AI 猜詞挑戰"}</h1>
                        <p>{"3分鐘限時 • 提問猜名詞"}</p>
                    </header>
                    <input
                        type="password"
                        placeholder="API Key"
                        autocomplete="off"
                        value={api_key_value(&self.config)}
                        oninput={cb_api_key}
                    />
                    <button onclick={cb_start}>{"開始新題目"}</button>
                    <aside>
                        <h3>{"規則說明"}</h3>
                        <ul>
                            { for RULES.iter().map(|&rule| html! { <li>{rule}</li> }) }
                        </ul>
                    </aside>
                </article>
            </div>
        }
    }

    fn view_round(&self, ctx: &Context<Self>) -> Html {
        let Some(puzzle) = self.session.puzzle() else {
            return html! {};
        };
        let is_playing = self.session.state().is_playing();

        let clock = is_playing.then(|| {
            let class = classes!("clock", self.session.is_running_low().then_some("low"));
            html! { <span {class}>{format_clock(self.session.remaining())}</span> }
        });

        let outcome = self
            .session
            .result()
            .zip(self.session.revealed_answer())
            .map(|(result, answer)| {
                let cb_restart = ctx.link().callback(|_: MouseEvent| Msg::StartRound);
                html! {
                    <section class={classes!("result", result_class(result))}>
                        <h3>{headline(result)}</h3>
                        <div class="answer">
                            <small>{"正確答案 (The Answer)"}</small>
                            <p>{answer.to_string()}</p>
                        </div>
                        <button onclick={cb_restart}>{"再玩一次"}</button>
                    </section>
                }
            });

        let thinking = self
            .session
            .is_judging()
            .then(|| html! { <li class="bubble assistant thinking">{"AI 思考中..."}</li> });

        html! {
            <div class="caici round">
                <aside class="puzzle">
                    <header>
                        <h2>{"當前謎題"}</h2>
                        { for clock }
                    </header>
                    <div class="riddle">
                        <span class="tag">{"類別"}</span>
                        <h3>{puzzle.title.clone()}</h3>
                        <p>{puzzle.content.clone()}</p>
                    </div>
                    { for outcome }
                </aside>
                <main class="chat">
                    <ol>
                        {
                            for self.session.transcript().iter().map(|msg| {
                                let speaker = match msg.role {
                                    Role::User => "user",
                                    Role::Assistant | Role::System => "assistant",
                                };
                                html! { <li class={classes!("bubble", speaker)}>{msg.content.clone()}</li> }
                            })
                        }
                        { for thinking }
                    </ol>
                    { self.view_input(ctx) }
                </main>
            </div>
        }
    }

    fn view_input(&self, ctx: &Context<Self>) -> Html {
        if !self.session.state().is_playing() {
            return html! { <p class="hint">{"遊戲已結束，請點擊左側按鈕重新開始。"}</p> };
        }

        let cb_input = ctx.link().callback(|e: InputEvent| {
            Msg::GuessInput(e.target_unchecked_into::<HtmlInputElement>().value())
        });
        let cb_submit = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::SubmitGuess
        });
        let cb_give_up = ctx.link().callback(|_: MouseEvent| Msg::GiveUp);
        let can_submit = !self.guess.trim().is_empty()
            && !self.session.is_judging()
            && !self.session.is_solved();

        html! {
            <form onsubmit={cb_submit}>
                <button type="button" title="放棄並查看答案" onclick={cb_give_up}>{"放棄"}</button>
                <input
                    type="text"
                    value={self.guess.clone()}
                    placeholder="提問特徵 (例如：是活的嗎？) 或直接猜詞..."
                    oninput={cb_input}
                />
                <button type="submit" disabled={!can_submit}>{"送出"}</button>
            </form>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let GameProps {
            endpoint,
            model,
            temperature,
        } = ctx.props().clone();

        Self {
            session: Session::new(),
            config: JudgeConfig::new(endpoint, model, temperature),
            guess: String::new(),
            countdown: None,
            win_reveal: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        let updated = match msg {
            ApiKeyInput(api_key) => {
                self.config.set_api_key(api_key);
                false
            }
            StartRound => self.start_round(ctx),
            PuzzleSettled(round, completion) => self.settle_puzzle(round, completion),
            GuessInput(guess) => {
                self.guess = guess;
                true
            }
            SubmitGuess => self.submit_guess(ctx),
            VerdictSettled(round, completion) => self.settle_verdict(ctx, round, completion),
            GiveUp => match self.session.give_up() {
                Ok(()) => true,
                Err(err) => {
                    log::debug!("give up ignored: {}", err);
                    false
                }
            },
            Tick => match self.session.tick() {
                TickOutcome::Idle => false,
                TickOutcome::Running(_) => true,
                TickOutcome::Expired => {
                    log::debug!("{}: time is up", self.session.round());
                    true
                }
            },
            DeclareWin(round) => {
                self.win_reveal = None;
                match self.session.declare_win(round) {
                    Ok(()) => true,
                    Err(err) => {
                        log::debug!("{}: win dropped: {}", round, err);
                        false
                    }
                }
            }
        };

        self.sync_countdown(ctx);
        updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        match self.session.state() {
            SessionState::Welcome => self.view_welcome(ctx),
            SessionState::Generating => html! {
                <div class="caici generating">
                    <p class="loading">{GENERATING_MESSAGE}</p>
                </div>
            },
            SessionState::Playing | SessionState::Ended => self.view_round(ctx),
        }
    }
}
