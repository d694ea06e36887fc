use super::executor;
use super::reader::ProgressReader;
use crate::progress::Clock;
use crate::{Config, PreparedRequest, RequestBuilder, RequestSpec, Response, Result};
use crate::{FetchError, TransportError};
use bytes::Bytes;
use reqwest::Method;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

/// Raw body handed back by a blocking [`Transport`]
pub type BoxRead = Box<dyn Read + Send>;
/// Body of the responses returned by the blocking [`Client`]
pub type Body = ProgressReader<BoxRead>;

/// Something able to perform a single blocking HTTP exchange
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &PreparedRequest,
    ) -> std::result::Result<Response<BoxRead>, TransportError>;
}

impl Transport for reqwest::blocking::Client {
    fn send(
        &self,
        request: &PreparedRequest,
    ) -> std::result::Result<Response<BoxRead>, TransportError> {
        let mut builder = self
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.to_vec());
        }
        let resp = builder.send()?;
        debug!("Status: {}", resp.status());
        let status = resp.status();
        let headers = resp.headers().clone();
        let content_length = resp.content_length();
        let url = resp.url().clone();
        let body: BoxRead = Box::new(resp);
        Ok(Response::new(status, headers, content_length, url, body))
    }
}

/// Blocking client, retries sleep on the calling thread
///
/// # Example
///
/// ```no_run
/// use manic_fetch::threaded::Client;
/// # fn main() -> manic_fetch::Result<()> {
/// let client = Client::new()?;
/// let text = client.get("https://crates.io").retry(2, std::time::Duration::from_secs(1)).text()?;
/// # Ok(())
/// # }
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
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }
    /// Client over a [`reqwest::blocking::Client`] set up from `config`
    ///
    /// Must not be called from within an async runtime.
    pub fn with_config(config: Config) -> Result<Self> {
        let builder = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout);
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
    pub fn execute(&self, spec: &RequestSpec) -> Result<Response<Body>> {
        let response = executor::execute(self.transport.as_ref(), spec)?;
        let total = response.content_length();
        Ok(response.map_body(|body| match spec.progress() {
            Some(progress) => {
                ProgressReader::new(body, total, progress.sink.clone(), progress.interval)
            }
            None => ProgressReader::passthrough(body),
        }))
    }
}

impl RequestBuilder<Client> {
    pub fn send(self) -> Result<Response<Body>> {
        let (client, spec) = self.into_parts();
        client.execute(&spec?)
    }
    pub fn bytes(self) -> Result<Bytes> {
        self.send()?.bytes()
    }
    pub fn text(self) -> Result<String> {
        self.send()?.text()
    }
    #[cfg(feature = "json")]
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.send()?.json()
    }
}

impl<R: Read, C: Clock> Response<ProgressReader<R, C>> {
    pub fn bytes(mut self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(self.content_length.unwrap_or(0).min(1 << 20) as usize);
        self.body.read_to_end(&mut buf).map_err(FetchError::Read)?;
        Ok(Bytes::from(buf))
    }
    pub fn text(self) -> Result<String> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
    #[cfg(feature = "json")]
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl<R: Read, C: Clock> Read for Response<ProgressReader<R, C>> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

/// Start a blocking `GET` request on a default client
pub fn get(url: &str) -> Result<RequestBuilder<Client>> {
    Ok(Client::new()?.get(url))
}

/// Start a blocking `POST` request on a default client
pub fn post(url: &str) -> Result<RequestBuilder<Client>> {
    Ok(Client::new()?.post(url))
}
