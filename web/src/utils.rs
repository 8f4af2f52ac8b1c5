use caici_core::{RoundError, Seconds};

/// Formats the round clock as `m:ss`.
pub(crate) fn format_clock(seconds: Seconds) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Blocking notice for errors the player has to acknowledge.
pub(crate) fn notify(err: &RoundError) {
    log::error!("{}", err);
    gloo::dialogs::alert(&err.notice());
}
