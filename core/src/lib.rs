#![no_std]

extern crate alloc;

pub use caici_protocol::{ChatMessage, FormatError, Puzzle, Role, Verdict};
pub use config::*;
pub use countdown::*;
pub use error::*;
pub use session::*;
pub use transcript::*;
pub use types::*;

pub mod prompt;

mod config;
mod countdown;
mod error;
mod session;
mod transcript;
mod types;
