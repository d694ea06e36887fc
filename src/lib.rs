//! Resilient HTTP requests with download progress
//!
//! Sends GET and POST requests, retries them on failure with a fixed pause
//! and streams the response body while reporting bytes completed, throughput,
//! elapsed and remaining time to a sink of your choice.
//!
//! A push based [`RateMeter`][progress::RateMeter] covers transfers that count
//! their own bytes.
//!
//! The crate exposes debug logs through the [`tracing`][tracing] crate,
//! retry messages meant for humans go to the request's log [`Sink`].
//!
//! ## Feature flags
//!
//! - `async`: Enables the tokio based client, on by default
//! - `threaded`: Enables the blocking client in [`threaded`]
//! - `progress`: Lets an `indicatif` progress bar receive progress samples
//! - `json`: Enables the `json` body helpers
//! - `rustls`: Use rustls for HTTPS, on by default
//! - `openssl`: Use openssl for HTTPS
//!
//! ## Crate usage
//!
//! ### Async example
//!
//! ```no_run
//! use manic_fetch::Client;
//! use std::sync::mpsc;
//! use std::time::Duration;
//! #[tokio::main]
//! async fn main() -> manic_fetch::Result<()> {
//!     let (progress, samples) = mpsc::sync_channel(16);
//!     let client = Client::new()?;
//!     let body = client
//!         .get("https://crates.io")
//!         .retry(3, Duration::from_secs(2))
//!         .tolerant()
//!         .progress(progress)
//!         .bytes()
//!         .await?;
//!     for sample in samples.try_iter() {
//!         println!("{}", sample);
//!     }
//!     println!("{} bytes", body.len());
//!     Ok(())
//! }
//! ```
//!
//! ### Native threading example
//!
//! ```no_run
//! # #[cfg(feature = "threaded")]
//! # fn main() -> manic_fetch::Result<()> {
//! use manic_fetch::threaded::Client;
//! use manic_fetch::TracingLog;
//! let text = Client::new()?
//!     .post("https://example.com/form")
//!     .form(vec![("name", "manic")])
//!     .log(TracingLog)
//!     .text()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "threaded"))]
//! # fn main() {}
//! ```
#[macro_use]
extern crate derive_builder;

#[cfg(feature = "progress")]
pub use indicatif::{ProgressBar, ProgressStyle};
pub use reqwest::{header, Method, StatusCode, Url};

#[cfg(feature = "async")]
#[doc(inline)]
pub use async_client::{get, post, Body, Client, ProgressStream, Transport};
#[cfg(all(not(feature = "async"), feature = "threaded"))]
#[doc(inline)]
pub use threaded::{get, post, Body, Client, ProgressReader, Transport};

pub use config::{
    Config, ConfigBuilder, ConfigBuilderError, DEFAULT_RETRY_INTERVAL, DEFAULT_USER_AGENT,
};
pub use error::{BoxError, FetchError, Result, TransportError};
pub use request::{PreparedRequest, RequestBuilder, RequestSpec, Response};
pub use retry::Retry;
pub use sink::{FnSink, LogSink, ProgressSink, Sink, TracingLog};
pub use status::{StatusPolicy, Verdict};

#[cfg(feature = "async")]
pub mod async_client;
mod config;
mod error;
pub mod progress;
mod request;
mod retry;
mod sink;
mod status;
#[cfg(test)]
mod test_util;
#[cfg(feature = "threaded")]
pub mod threaded;
