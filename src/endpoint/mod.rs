//! Remote assistant service client
//!
//! The chat and image-generation panels both talk to the same remote service.
//! `ChatEndpoint` is the seam between the dispatch logic and the wire so the
//! lifecycle can be exercised against a scripted endpoint in tests.

pub mod client;
pub mod types;

pub use client::{ChatEndpoint, HttpEndpoint};
pub use types::{ChatReply, ChatRequest, HealthReply, ImageReply, ImageRequest, ImageStyle};
