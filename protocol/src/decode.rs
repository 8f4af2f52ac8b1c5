use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{Puzzle, Verdict};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Model returned an empty completion")]
    EmptyCompletion,
    #[error("Completion is not the expected JSON: {0}")]
    InvalidJson(String),
    #[error("Field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("Riddle text gives away the answer")]
    AnswerLeaked,
}

pub type Result<T> = core::result::Result<T, FormatError>;

fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FormatError::EmptyCompletion);
    }
    serde_json::from_str(raw).map_err(|err| FormatError::InvalidJson(err.to_string()))
}

fn require(field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormatError::EmptyField(field))
    } else if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Decodes a generation completion into a [`Puzzle`].
///
/// All three fields must be non-blank, and the riddle text must not contain
/// the answer verbatim.
pub fn decode_puzzle(raw: &str) -> Result<Puzzle> {
    let Puzzle {
        title,
        content,
        answer,
    } = decode_json(raw)?;

    let puzzle = Puzzle {
        title: require("title", title)?,
        content: require("content", content)?,
        answer: require("answer", answer)?,
    };

    if puzzle.content.contains(puzzle.answer.as_str()) {
        return Err(FormatError::AnswerLeaked);
    }

    Ok(puzzle)
}

/// Decodes a judgment completion into a [`Verdict`].
///
/// A blank `reply` is kept as an empty string; `solved` is never overridden
/// by the reply text.
pub fn decode_verdict(raw: &str) -> Result<Verdict> {
    let Verdict { reply, solved } = decode_json(raw)?;
    Ok(Verdict {
        reply: reply.trim().to_owned(),
        solved,
    })
}

/// What to show when a judgment completion could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReply {
    /// The model answered in plain prose; show it as is.
    Prose(String),
    /// The completion was broken JSON or empty.
    Unavailable,
}

impl FallbackReply {
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('{') {
            Self::Unavailable
        } else {
            Self::Prose(trimmed.to_owned())
        }
    }
}
