use super::executor;
use super::stream::ProgressStream;
use crate::progress::Clock;
use crate::{Config, FetchError, PreparedRequest, RequestBuilder, RequestSpec, Response, Result};
use crate::TransportError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use futures::Stream;
use reqwest::Method;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// Raw body handed back by a [`Transport`]
pub type BoxBody = BoxStream<'static, io::Result<Bytes>>;
/// Body of the responses returned by [`Client`]
pub type Body = ProgressStream<BoxBody>;

/// Something able to perform a single HTTP exchange
///
/// Implemented for [`reqwest::Client`]; tests and custom stacks can provide
/// their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &PreparedRequest,
    ) -> std::result::Result<Response<BoxBody>, TransportError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(
        &self,
        request: &PreparedRequest,
    ) -> std::result::Result<Response<BoxBody>, TransportError> {
        let mut builder = self
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let resp = builder.send().await?;
        debug!("Status: {}", resp.status());
        let status = resp.status();
        let headers = resp.headers().clone();
        let content_length = resp.content_length();
        let url = resp.url().clone();
        let body = resp
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .boxed();
        Ok(Response::new(status, headers, content_length, url, body))
    }
}

/// Async client executing requests with retries and progress reporting
///
/// # Example
///
/// ```no_run
/// use manic_fetch::Client;
/// use std::time::Duration;
/// #[tokio::main]
/// async fn main() -> manic_fetch::Result<()> {
///     let client = Client::new()?;
///     let body = client
///         .get("https://crates.io")
///         .retry(3, Duration::from_secs(1))
///         .bytes()
///         .await?;
///     println!("{} bytes", body.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Config,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish()
    }
}

impl Client {
    /// Client over a default [`reqwest::Client`]
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }
    /// Client over a [`reqwest::Client`] set up from `config`
    pub fn with_config(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_transport(builder.build()?, config))
    }
    pub fn with_transport<T>(transport: T, config: Config) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            transport: Arc::new(transport),
            config,
        }
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder<Client> {
        RequestBuilder::new(self.clone(), RequestSpec::new(method, url, &self.config))
    }
    pub fn get(&self, url: &str) -> RequestBuilder<Client> {
        self.request(Method::GET, url)
    }
    pub fn post(&self, url: &str) -> RequestBuilder<Client> {
        self.request(Method::POST, url)
    }
    /// Perform the request described by `spec`
    ///
    /// The returned body reports progress to the sink of `spec` while it is read.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Response<Body>> {
        let response = executor::execute(self.transport.as_ref(), spec).await?;
        let total = response.content_length();
        Ok(response.map_body(|body| match spec.progress() {
            Some(progress) => {
                ProgressStream::new(body, total, progress.sink.clone(), progress.interval)
            }
            None => ProgressStream::passthrough(body),
        }))
    }
}

impl RequestBuilder<Client> {
    pub async fn send(self) -> Result<Response<Body>> {
        let (client, spec) = self.into_parts();
        client.execute(&spec?).await
    }
    /// Send the request and collect the whole body
    pub async fn bytes(self) -> Result<Bytes> {
        self.send().await?.bytes().await
    }
    pub async fn text(self) -> Result<String> {
        self.send().await?.text().await
    }
    #[cfg(feature = "json")]
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.send().await?.json().await
    }
}

impl<S, C> Response<ProgressStream<S, C>>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
    C: Clock + Unpin,
{
    /// Next chunk of the body, `None` once it is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        self.body.next().await.transpose().map_err(FetchError::Read)
    }
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
    #[cfg(feature = "json")]
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Start a `GET` request on a default client
pub fn get(url: &str) -> Result<RequestBuilder<Client>> {
    Ok(Client::new()?.get(url))
}

/// Start a `POST` request on a default client
pub fn post(url: &str) -> Result<RequestBuilder<Client>> {
    Ok(Client::new()?.post(url))
}
