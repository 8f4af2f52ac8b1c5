use alloc::string::String;
use alloc::vec::Vec;
use caici_protocol::{FallbackReply, decode_puzzle, decode_verdict};

use crate::prompt::{JUDGE_UNAVAILABLE, REPLY_SOLVED, WELCOME_MESSAGE};
use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Welcome,
    Generating,
    Playing,
    Ended,
}

impl SessionState {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// A new round may only be requested from these states.
    pub const fn can_start_round(self) -> bool {
        matches!(self, Self::Welcome | Self::Ended)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoundResult {
    Win,
    Lose,
    GiveUp,
}

/// Prompt to send to the judge, tagged with the round it was issued for.
#[derive(Clone, Debug, PartialEq)]
pub struct JudgeRequest {
    pub round: RoundId,
    pub messages: Vec<ChatMessage>,
}

/// Result of settling a puzzle generation.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundStart {
    Playing,
    /// Generation failed and the session went back to the welcome screen.
    Aborted(RoundError),
}

/// Result of settling a judgment.
#[derive(Clone, Debug, PartialEq)]
pub enum VerdictOutcome {
    Answered,
    /// Call [`Session::declare_win`] after [`WIN_REVEAL_DELAY_MS`].
    Solved,
    /// The completion did not decode; a fallback reply was shown instead.
    Degraded(FormatError),
    /// The judge could not be reached; the unavailable line was shown.
    Unavailable(RoundError),
}

impl VerdictOutcome {
    pub const fn is_solved(&self) -> bool {
        matches!(self, Self::Solved)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock is not running.
    Idle,
    Running(Seconds),
    /// Time ran out and the round was lost.
    Expired,
}

/// One player's game: the current round's puzzle, transcript and clock.
///
/// Every transition is a method that either applies completely or returns a
/// [`SessionError`] without touching the session. Network calls and timers are
/// driven from outside; results come back through the `*_settled` methods
/// together with the [`RoundId`] they were issued for.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    state: SessionState,
    round: RoundId,
    puzzle: Option<Puzzle>,
    transcript: Transcript,
    countdown: Countdown,
    result: Option<RoundResult>,
    judging: bool,
    solved: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Welcome,
            round: RoundId::default(),
            puzzle: None,
            transcript: Transcript::default(),
            countdown: Countdown::default(),
            result: None,
            judging: false,
            solved: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn remaining(&self) -> Seconds {
        self.countdown.remaining()
    }

    pub fn is_running_low(&self) -> bool {
        self.countdown.is_running_low()
    }

    pub fn is_judging(&self) -> bool {
        self.judging
    }

    /// Solved, waiting for [`Session::declare_win`].
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// The answer, once the round is over.
    pub fn revealed_answer(&self) -> Option<&str> {
        match self.state {
            SessionState::Ended => self.puzzle.as_ref().map(|puzzle| puzzle.answer.as_str()),
            _ => None,
        }
    }

    /// Leaves `welcome`/`ended` for `generating` and returns the generation prompt.
    pub fn begin_round(&mut self) -> Result<JudgeRequest> {
        if !self.state.can_start_round() {
            return Err(SessionError::RoundInFlight);
        }

        self.round = self.round.next();
        self.reset_round(None);
        self.state = SessionState::Generating;
        log::debug!("{}: generating puzzle", self.round);

        Ok(JudgeRequest {
            round: self.round,
            messages: prompt::generation_messages(),
        })
    }

    /// Applies the generation completion for `round`.
    pub fn generation_settled(
        &mut self,
        round: RoundId,
        completion: core::result::Result<String, RoundError>,
    ) -> Result<RoundStart> {
        self.check_round(round)?;
        if !matches!(self.state, SessionState::Generating) {
            return Err(SessionError::StaleRound);
        }

        let puzzle =
            completion.and_then(|raw| decode_puzzle(&raw).map_err(RoundError::from));

        Ok(match puzzle {
            Ok(puzzle) => {
                log::debug!("{}: puzzle ready ({})", self.round, puzzle.title);
                self.reset_round(Some(puzzle));
                self.transcript = Transcript::opening(WELCOME_MESSAGE);
                self.state = SessionState::Playing;
                RoundStart::Playing
            }
            Err(err) => {
                log::error!("{}: puzzle generation failed: {}", self.round, err);
                self.reset_round(None);
                self.state = SessionState::Welcome;
                RoundStart::Aborted(err)
            }
        })
    }

    /// Records the player's question and returns the judgment prompt for it.
    pub fn submit_guess(&mut self, text: &str) -> Result<JudgeRequest> {
        self.check_open_for_play()?;
        if self.judging {
            return Err(SessionError::JudgeBusy);
        }

        let question = text.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyGuess);
        }

        let Some(puzzle) = self.puzzle.as_ref() else {
            return Err(SessionError::NotPlaying);
        };
        let messages = prompt::judgment_messages(puzzle, question);

        self.transcript.push_user(question);
        self.judging = true;
        log::debug!("{}: judging {:?}", self.round, question);

        Ok(JudgeRequest {
            round: self.round,
            messages,
        })
    }

    /// Applies the judgment completion for `round`.
    ///
    /// The in-flight flag is cleared even when the result arrives after the
    /// round ended; such results are dropped with [`SessionError::StaleRound`].
    pub fn verdict_settled(
        &mut self,
        round: RoundId,
        completion: core::result::Result<String, RoundError>,
    ) -> Result<VerdictOutcome> {
        self.check_round(round)?;
        if !self.judging {
            return Err(SessionError::StaleRound);
        }
        self.judging = false;

        if !self.state.is_playing() {
            log::debug!("{}: dropping verdict, round already over", self.round);
            return Err(SessionError::StaleRound);
        }

        let raw = match completion {
            Ok(raw) => raw,
            Err(err) => {
                log::error!("{}: judge unavailable: {}", self.round, err);
                self.transcript.push_assistant(JUDGE_UNAVAILABLE);
                return Ok(VerdictOutcome::Unavailable(err));
            }
        };

        Ok(match decode_verdict(&raw) {
            Ok(verdict) => {
                let reply = match (verdict.reply.is_empty(), verdict.solved) {
                    (false, _) => verdict.reply,
                    (true, true) => REPLY_SOLVED.into(),
                    (true, false) => JUDGE_UNAVAILABLE.into(),
                };
                self.transcript.push_assistant(reply);
                if verdict.solved {
                    log::debug!("{}: solved", self.round);
                    self.solved = true;
                    VerdictOutcome::Solved
                } else {
                    VerdictOutcome::Answered
                }
            }
            Err(err) => {
                log::warn!("{}: undecodable verdict ({}): {:?}", self.round, err, raw);
                match FallbackReply::classify(&raw) {
                    FallbackReply::Prose(text) => self.transcript.push_assistant(text),
                    FallbackReply::Unavailable => self.transcript.push_assistant(JUDGE_UNAVAILABLE),
                }
                VerdictOutcome::Degraded(err)
            }
        })
    }

    /// Ends a solved round as won.
    pub fn declare_win(&mut self, round: RoundId) -> Result<()> {
        self.check_round(round)?;
        if !(self.state.is_playing() && self.solved) {
            return Err(SessionError::StaleRound);
        }
        self.end_round(RoundResult::Win);
        Ok(())
    }

    pub fn give_up(&mut self) -> Result<()> {
        self.check_open_for_play()?;
        self.end_round(RoundResult::GiveUp);
        Ok(())
    }

    /// Advances the clock by one second; the round is lost when it reaches zero.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_playing() || self.solved {
            return TickOutcome::Idle;
        }

        let remaining = self.countdown.tick();
        log::trace!("{}: {}s left", self.round, remaining);

        if self.countdown.is_expired() {
            self.end_round(RoundResult::Lose);
            TickOutcome::Expired
        } else {
            TickOutcome::Running(remaining)
        }
    }

    fn reset_round(&mut self, puzzle: Option<Puzzle>) {
        self.puzzle = puzzle;
        self.transcript.clear();
        self.countdown = Countdown::new(ROUND_SECONDS);
        self.result = None;
        self.judging = false;
        self.solved = false;
    }

    fn end_round(&mut self, result: RoundResult) {
        if matches!(self.state, SessionState::Ended) {
            return;
        }

        log::debug!("{}: ended ({:?})", self.round, result);
        self.state = SessionState::Ended;
        self.result = Some(result);
    }

    fn check_round(&self, round: RoundId) -> Result<()> {
        if round == self.round {
            Ok(())
        } else {
            Err(SessionError::StaleRound)
        }
    }

    fn check_open_for_play(&self) -> Result<()> {
        if !self.state.is_playing() {
            Err(SessionError::NotPlaying)
        } else if self.solved {
            Err(SessionError::AlreadySolved)
        } else {
            Ok(())
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    const APPLE: &str = r#"{"title":"水果","content":"我有紅色的外衣，咬下去很清脆。","answer":"蘋果"}"#;

    fn playing() -> Session {
        let mut session = Session::new();
        let request = session.begin_round().unwrap();
        assert_eq!(
            session
                .generation_settled(request.round, Ok(APPLE.to_string()))
                .unwrap(),
            RoundStart::Playing
        );
        session
    }

    fn ask(session: &mut Session, text: &str, raw: &str) -> VerdictOutcome {
        let request = session.submit_guess(text).unwrap();
        session
            .verdict_settled(request.round, Ok(raw.to_string()))
            .unwrap()
    }

    #[test]
    fn round_starts_with_welcome_line_and_full_clock() {
        let session = playing();

        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.puzzle().unwrap().answer, "蘋果");
        assert_eq!(session.remaining(), ROUND_SECONDS);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript().messages()[0].role, Role::Assistant);
        assert_eq!(session.result(), None);
    }

    #[test]
    fn cannot_begin_round_while_one_is_in_flight() {
        let mut session = Session::new();
        session.begin_round().unwrap();

        assert_eq!(session.begin_round(), Err(SessionError::RoundInFlight));

        let mut session = playing();
        assert_eq!(session.begin_round(), Err(SessionError::RoundInFlight));
    }

    #[test]
    fn failed_generation_returns_to_welcome() {
        let mut session = Session::new();
        let request = session.begin_round().unwrap();

        let outcome = session
            .generation_settled(request.round, Err(RoundError::Transport("HTTP 401".into())))
            .unwrap();

        assert_eq!(
            outcome,
            RoundStart::Aborted(RoundError::Transport("HTTP 401".into()))
        );
        assert_eq!(session.state(), SessionState::Welcome);
        assert_eq!(session.puzzle(), None);
    }

    #[test]
    fn malformed_puzzle_is_a_format_error() {
        let mut session = Session::new();
        let request = session.begin_round().unwrap();

        let outcome = session
            .generation_settled(request.round, Ok("here is a riddle for you".to_string()))
            .unwrap();

        assert!(matches!(
            outcome,
            RoundStart::Aborted(RoundError::Format(FormatError::InvalidJson(_)))
        ));
        assert_eq!(session.state(), SessionState::Welcome);
        assert!(session.begin_round().is_ok());
    }

    #[test]
    fn guessing_scenario_ends_in_win_with_answer_revealed() {
        let mut session = playing();

        let outcome = ask(&mut session, "是紅色的嗎？", r#"{"reply":"是","solved":false}"#);
        assert_eq!(outcome, VerdictOutcome::Answered);
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.state(), SessionState::Playing);

        let outcome = ask(&mut session, "蘋果", r#"{"reply":"恭喜答對！","solved":true}"#);
        assert!(outcome.is_solved());
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.revealed_answer(), None);

        session.declare_win(session.round()).unwrap();
        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(session.result(), Some(RoundResult::Win));
        assert_eq!(session.revealed_answer(), Some("蘋果"));
    }

    #[test]
    fn solved_round_cannot_be_lost_before_the_win_lands() {
        let mut session = playing();
        ask(&mut session, "蘋果", r#"{"reply":"恭喜答對！","solved":true}"#);

        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.give_up(), Err(SessionError::AlreadySolved));
        assert_eq!(session.submit_guess("再問一次"), Err(SessionError::AlreadySolved));

        session.declare_win(session.round()).unwrap();
        assert_eq!(session.result(), Some(RoundResult::Win));
    }

    #[test]
    fn solved_verdict_with_blank_reply_still_wins() {
        let mut session = playing();

        let outcome = ask(&mut session, "蘋果", r#"{"reply":"","solved":true}"#);

        assert_eq!(outcome, VerdictOutcome::Solved);
        assert!(session.is_solved());
        assert_eq!(session.transcript().last().unwrap().content, REPLY_SOLVED);

        session.declare_win(session.round()).unwrap();
        assert_eq!(session.result(), Some(RoundResult::Win));
    }

    #[test]
    fn unsolved_verdict_with_blank_reply_shows_unavailable_line() {
        let mut session = playing();

        let outcome = ask(&mut session, "是水果嗎？", r#"{"reply":" ","solved":false}"#);

        assert_eq!(outcome, VerdictOutcome::Answered);
        assert_eq!(session.transcript().last().unwrap().content, JUDGE_UNAVAILABLE);
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn second_submission_while_judging_is_rejected() {
        let mut session = playing();
        let first = session.submit_guess("是動物嗎？").unwrap();

        assert_eq!(session.submit_guess("是植物嗎？"), Err(SessionError::JudgeBusy));
        assert_eq!(session.transcript().count(Role::User), 1);
        assert!(session.is_judging());

        session
            .verdict_settled(first.round, Ok(r#"{"reply":"不是","solved":false}"#.to_string()))
            .unwrap();
        assert!(!session.is_judging());
        assert!(session.submit_guess("是植物嗎？").is_ok());
    }

    #[test]
    fn blank_guess_is_rejected() {
        let mut session = playing();

        assert_eq!(session.submit_guess("  \t"), Err(SessionError::EmptyGuess));
        assert_eq!(session.transcript().len(), 1);
        assert!(!session.is_judging());
    }

    #[test]
    fn guesses_are_trimmed_in_transcript() {
        let mut session = playing();
        session.submit_guess("  會飛嗎？ ").unwrap();

        assert_eq!(session.transcript().last().unwrap().content, "會飛嗎？");
    }

    #[test]
    fn prose_verdict_is_shown_verbatim() {
        let mut session = playing();

        let outcome = ask(&mut session, "是水果嗎？", "是的，它是一種水果。");

        assert!(matches!(outcome, VerdictOutcome::Degraded(_)));
        assert_eq!(session.transcript().last().unwrap().content, "是的，它是一種水果。");
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn broken_json_verdict_shows_unavailable_line() {
        let mut session = playing();

        let outcome = ask(&mut session, "是水果嗎？", r#"{"reply": "是", "solved": "#);

        assert!(matches!(outcome, VerdictOutcome::Degraded(_)));
        assert_eq!(session.transcript().last().unwrap().content, JUDGE_UNAVAILABLE);
    }

    #[test]
    fn transport_failure_during_play_keeps_round_going() {
        let mut session = playing();
        let request = session.submit_guess("是水果嗎？").unwrap();

        let outcome = session
            .verdict_settled(request.round, Err(RoundError::Transport("offline".into())))
            .unwrap();

        assert!(matches!(outcome, VerdictOutcome::Unavailable(_)));
        assert_eq!(session.transcript().last().unwrap().content, JUDGE_UNAVAILABLE);
        assert_eq!(session.state(), SessionState::Playing);
        assert!(!session.is_judging());
    }

    #[test]
    fn transcript_keeps_one_user_message_per_submission_in_order() {
        let mut session = playing();
        let questions = ["是動物嗎？", "是食物嗎？", "是紅色的嗎？", "香蕉"];

        for (i, question) in questions.iter().enumerate() {
            let request = session.submit_guess(question).unwrap();
            let completion = match i {
                1 => Err(RoundError::Transport("timeout".into())),
                2 => Ok("{oops".to_string()),
                _ => Ok(r#"{"reply":"不是","solved":false}"#.to_string()),
            };
            session.verdict_settled(request.round, completion).unwrap();
        }

        let transcript = session.transcript();
        let users: Vec<&str> = transcript
            .iter()
            .filter(|msg| msg.role == Role::User)
            .map(|msg| msg.content.as_str())
            .collect();
        assert_eq!(users, questions);
        assert!(transcript.count(Role::Assistant) <= questions.len() + 1);
        assert_eq!(transcript.messages()[0].content, WELCOME_MESSAGE);
    }

    #[test]
    fn give_up_ends_round_regardless_of_clock() {
        let mut session = playing();
        for _ in 0..(ROUND_SECONDS - 1) {
            session.tick();
        }
        assert_eq!(session.remaining(), 1);

        session.give_up().unwrap();

        assert_eq!(session.result(), Some(RoundResult::GiveUp));
        assert_eq!(session.revealed_answer(), Some("蘋果"));
        assert_eq!(session.give_up(), Err(SessionError::NotPlaying));
        assert_eq!(session.result(), Some(RoundResult::GiveUp));
    }

    #[test]
    fn clock_runs_out_exactly_once() {
        let mut session = playing();

        for expected in (1..ROUND_SECONDS).rev() {
            assert_eq!(session.tick(), TickOutcome::Running(expected));
        }
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(session.result(), Some(RoundResult::Lose));
        assert_eq!(session.remaining(), 0);

        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.remaining(), 0);
        assert_eq!(session.give_up(), Err(SessionError::NotPlaying));
        assert_eq!(session.result(), Some(RoundResult::Lose));
    }

    #[test]
    fn clock_is_idle_outside_play() {
        let mut session = Session::new();
        assert_eq!(session.tick(), TickOutcome::Idle);

        session.begin_round().unwrap();
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.remaining(), ROUND_SECONDS);
    }

    #[test]
    fn verdict_after_give_up_is_dropped() {
        let mut session = playing();
        let request = session.submit_guess("蘋果").unwrap();
        session.give_up().unwrap();

        let settled = session.verdict_settled(
            request.round,
            Ok(r#"{"reply":"恭喜答對！","solved":true}"#.to_string()),
        );

        assert_eq!(settled, Err(SessionError::StaleRound));
        assert_eq!(session.result(), Some(RoundResult::GiveUp));
        assert_eq!(session.transcript().count(Role::Assistant), 1);
        assert!(!session.is_judging());
    }

    #[test]
    fn results_from_previous_round_are_ignored() {
        let mut session = playing();
        let old = session.submit_guess("蘋果").unwrap();
        ask_and_solve_then_restart(&mut session, old.round);

        let request = session.begin_round().unwrap();
        assert_ne!(request.round, old.round);

        assert_eq!(
            session.verdict_settled(old.round, Ok(r#"{"reply":"是","solved":false}"#.to_string())),
            Err(SessionError::StaleRound)
        );
        assert_eq!(session.declare_win(old.round), Err(SessionError::StaleRound));
        assert_eq!(session.state(), SessionState::Generating);
        assert!(session.transcript().is_empty());

        session
            .generation_settled(request.round, Ok(APPLE.to_string()))
            .unwrap();
        assert_eq!(session.remaining(), ROUND_SECONDS);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.result(), None);
    }

    fn ask_and_solve_then_restart(session: &mut Session, round: RoundId) {
        session
            .verdict_settled(round, Ok(r#"{"reply":"恭喜答對！","solved":true}"#.to_string()))
            .unwrap();
        session.declare_win(round).unwrap();
        assert_eq!(session.state(), SessionState::Ended);
    }

    #[test]
    fn late_generation_result_is_ignored_after_restart() {
        let mut session = Session::new();
        let first = session.begin_round().unwrap();
        session
            .generation_settled(first.round, Err(RoundError::Transport("x".into())))
            .unwrap();
        let second = session.begin_round().unwrap();

        assert_eq!(
            session.generation_settled(first.round, Ok(APPLE.to_string())),
            Err(SessionError::StaleRound)
        );
        assert_eq!(session.state(), SessionState::Generating);
        assert!(session.generation_settled(second.round, Ok(APPLE.to_string())).is_ok());
    }
}
