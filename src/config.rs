use crate::progress::SAMPLE_CADENCE;
use crate::{FetchError, StatusPolicy};
use std::time::Duration;

/// Pause between two attempts unless a request overrides it
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// User agent sent by clients built from the default config
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Defaults shared by every request a client creates
///
/// ```
/// use manic_fetch::ConfigBuilder;
/// use std::time::Duration;
/// # fn main() -> manic_fetch::Result<()> {
/// let config = ConfigBuilder::default()
///     .retries(3)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// assert_eq!(config.retries, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Extra attempts after the first one
    #[builder(default)]
    pub retries: u32,
    #[builder(default = "DEFAULT_RETRY_INTERVAL")]
    pub retry_interval: Duration,
    /// Minimum time between two progress samples
    #[builder(default = "SAMPLE_CADENCE")]
    pub progress_interval: Duration,
    /// Per request timeout applied by the HTTP client
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,
    #[builder(default = "DEFAULT_USER_AGENT.to_string()", setter(into))]
    pub user_agent: String,
    #[builder(default)]
    pub status: StatusPolicy,
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(Some(timeout)) = self.timeout {
            if timeout.is_zero() {
                return Err("timeout must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            progress_interval: SAMPLE_CADENCE,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            status: StatusPolicy::default(),
        }
    }
}

impl From<ConfigBuilderError> for FetchError {
    fn from(e: ConfigBuilderError) -> Self {
        FetchError::Config(e.to_string())
    }
}
