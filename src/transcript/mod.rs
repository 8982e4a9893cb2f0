//! Conversation transcript
//!
//! The transcript is the ordered sequence of user and bot turns shown to the
//! user. Turns are append-only; the only other mutation is a wholesale clear.

pub mod storage;
pub mod types;

pub use storage::Transcript;
pub use types::{Sender, Turn};
