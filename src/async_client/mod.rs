//! Tokio based flavor built on the async [`reqwest::Client`]
//!
//! Retry pauses await on the calling task, response bodies are
//! [`futures::Stream`]s of [`bytes::Bytes`].
mod client;
mod executor;
mod stream;

pub use client::{get, post, Body, BoxBody, Client, Transport};
pub use stream::ProgressStream;
