//! Message dispatch to the remote chat endpoint
//!
//! Owns the request/response cycle for user messages: validation, the typing
//! indicator, the single chat request, and the canned fallback that masks
//! endpoint failures from the user.

pub mod dispatcher;

pub use dispatcher::{
    fallback_reply, DispatchEvent, Dispatcher, TypingIndicator, CLEARED_MESSAGE, FALLBACK_REPLIES,
};
