use crate::progress::ProgressSample;
use crate::sink::{LogSink, ProgressSink, Sink};
use crate::{Config, FetchError, Result, Retry, StatusPolicy};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::{Method, StatusCode, Url};
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Where progress samples go and how often
#[derive(Clone)]
pub(crate) struct ProgressConfig {
    pub(crate) sink: ProgressSink,
    pub(crate) interval: Duration,
}

/// Everything needed to perform one call, immutable once execution starts
#[derive(Clone)]
pub struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) form: Option<Vec<(String, String)>>,
    pub(crate) retry: Retry,
    pub(crate) status: StatusPolicy,
    pub(crate) log: Option<LogSink>,
    pub(crate) progress: Option<ProgressConfig>,
    progress_interval: Duration,
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("form", &self.form)
            .field("retry", &self.retry)
            .field("status", &self.status)
            .field("log", &self.log.is_some())
            .field("progress", &self.progress.as_ref().map(|p| p.interval))
            .finish()
    }
}

impl RequestSpec {
    /// Parse the url and start from the defaults of `config`
    pub fn new(method: Method, url: &str, config: &Config) -> Result<Self> {
        let url = Url::parse(url)?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }
        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            form: None,
            retry: Retry::new(config.retries, config.retry_interval),
            status: config.status.clone(),
            log: None,
            progress: None,
            progress_interval: config.progress_interval,
        })
    }
    pub fn method(&self) -> &Method {
        &self.method
    }
    pub fn url(&self) -> &Url {
        &self.url
    }
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    pub fn form(&self) -> Option<&[(String, String)]> {
        self.form.as_deref()
    }
    pub fn retry(&self) -> Retry {
        self.retry
    }
    pub fn status(&self) -> &StatusPolicy {
        &self.status
    }
    pub(crate) fn log_sink(&self) -> Option<&LogSink> {
        self.log.as_ref()
    }
    pub(crate) fn progress(&self) -> Option<&ProgressConfig> {
        self.progress.as_ref()
    }

    /// Turn the description into what the transport sends on every attempt
    ///
    /// Form fields go to the query string for `GET` and `HEAD`, any other
    /// method gets them url-encoded in the body. A `Content-Type` header set
    /// by the caller is never overwritten.
    pub fn prepare(&self) -> PreparedRequest {
        let mut url = self.url.clone();
        let mut headers = self.headers.clone();
        let mut body = None;
        if let Some(form) = self.form.as_ref().filter(|f| !f.is_empty()) {
            if self.method == Method::GET || self.method == Method::HEAD {
                url.query_pairs_mut().extend_pairs(form.iter());
            } else {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(form.iter())
                    .finish();
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                }
                body = Some(Bytes::from(encoded));
            }
        }
        PreparedRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
        }
    }
}

/// Transport ready request, reused as is by every attempt
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Builder for one call made through client `C`
///
/// Invalid input is remembered and reported when the request is sent.
pub struct RequestBuilder<C> {
    client: C,
    spec: Result<RequestSpec>,
}

impl<C> fmt::Debug for RequestBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("spec", &self.spec)
            .finish()
    }
}

impl<C> RequestBuilder<C> {
    pub(crate) fn new(client: C, spec: Result<RequestSpec>) -> RequestBuilder<C> {
        RequestBuilder { client, spec }
    }

    pub(crate) fn into_parts(self) -> (C, Result<RequestSpec>) {
        (self.client, self.spec)
    }

    /// Set a header, replacing any value set before for the same name
    pub fn header<K, V>(mut self, key: K, value: V) -> RequestBuilder<C>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<FetchError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<FetchError>,
    {
        let mut error: Option<FetchError> = None;
        if let Ok(ref mut spec) = self.spec {
            match <HeaderName as TryFrom<K>>::try_from(key) {
                Ok(key) => match <HeaderValue as TryFrom<V>>::try_from(value) {
                    Ok(value) => {
                        spec.headers.insert(key, value);
                    }
                    Err(e) => error = Some(e.into()),
                },
                Err(e) => error = Some(e.into()),
            };
        }
        if let Some(err) = error {
            self.spec = Err(err);
        }
        self
    }

    /// Merge a whole header map, its names replace earlier values
    pub fn headers(mut self, headers: HeaderMap) -> RequestBuilder<C> {
        if let Ok(ref mut spec) = self.spec {
            for name in headers.keys() {
                spec.headers.remove(name);
            }
            for (name, value) in headers.iter() {
                spec.headers.append(name.clone(), value.clone());
            }
        }
        self
    }

    pub fn referer(self, referer: &str) -> RequestBuilder<C> {
        self.header(REFERER, referer)
    }

    /// Form fields of the request, replacing fields set before
    pub fn form<I, K, V>(mut self, fields: I) -> RequestBuilder<C>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if let Ok(ref mut spec) = self.spec {
            spec.form = Some(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            );
        }
        self
    }

    /// Repeat failed attempts `count` more times, waiting `interval` in between
    pub fn retry(mut self, count: u32, interval: Duration) -> RequestBuilder<C> {
        if let Ok(ref mut spec) = self.spec {
            spec.retry = Retry::new(count, interval);
        }
        self
    }

    pub fn status(mut self, policy: StatusPolicy) -> RequestBuilder<C> {
        if let Ok(ref mut spec) = self.spec {
            spec.status = policy;
        }
        self
    }

    /// Accept exactly the given status codes
    pub fn accept<I>(self, codes: I) -> RequestBuilder<C>
    where
        I: IntoIterator<Item = u16>,
    {
        self.status(StatusPolicy::explicit(codes))
    }

    /// Treat `404 Not Found` as final instead of retrying it
    pub fn tolerant(self) -> RequestBuilder<C> {
        self.status(StatusPolicy::Tolerant)
    }

    /// Send retry and failure messages to `sink`
    pub fn log<S>(mut self, sink: S) -> RequestBuilder<C>
    where
        S: Sink<String> + 'static,
    {
        if let Ok(ref mut spec) = self.spec {
            spec.log = Some(Arc::new(sink));
        }
        self
    }

    /// Report download progress to `sink`
    ///
    /// Samples are spaced by the progress interval of the client config.
    pub fn progress<S>(self, sink: S) -> RequestBuilder<C>
    where
        S: Sink<ProgressSample> + 'static,
    {
        if let Ok(spec) = &self.spec {
            let interval = spec.progress_interval;
            return self.progress_every(sink, interval);
        }
        self
    }

    /// Report download progress to `sink`, at most once per `interval`
    pub fn progress_every<S>(mut self, sink: S, interval: Duration) -> RequestBuilder<C>
    where
        S: Sink<ProgressSample> + 'static,
    {
        if let Ok(ref mut spec) = self.spec {
            spec.progress = Some(ProgressConfig {
                sink: Arc::new(sink),
                interval,
            });
        }
        self
    }

    pub fn build(self) -> Result<RequestSpec> {
        self.spec
    }
}

/// Response accepted by the status policy, `B` is the body
pub struct Response<B> {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) content_length: Option<u64>,
    pub(crate) url: Url,
    pub(crate) body: B,
}

impl<B> fmt::Debug for Response<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("content_length", &self.content_length)
            .field("headers", &self.headers)
            .finish()
    }
}

impl<B> Response<B> {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        content_length: Option<u64>,
        url: Url,
        body: B,
    ) -> Self {
        Self {
            status,
            headers,
            content_length,
            url,
            body,
        }
    }
    pub fn status(&self) -> StatusCode {
        self.status
    }
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    /// Size announced by the server, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
    /// Url of the response after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }
    pub fn into_body(self) -> B {
        self.body
    }
    pub fn map_body<T, F>(self, f: F) -> Response<T>
    where
        F: FnOnce(B) -> T,
    {
        Response {
            status: self.status,
            headers: self.headers,
            content_length: self.content_length,
            url: self.url,
            body: f(self.body),
        }
    }
}
