//! Blocking flavor built on [`reqwest::blocking`]
//!
//! Mirrors the async API: retry pauses block the calling thread and response
//! bodies implement [`std::io::Read`].
mod client;
mod executor;
mod reader;

pub use client::{get, post, Body, BoxRead, Client, Transport};
pub use reader::ProgressReader;
