use std::time::Duration;

use packsync_core::api::ApiError;
use secrecy::{ExposeSecret, SecretString};
use tracing::trace;
use url::Url;

/// Generous default, since pack updates stream whole audio files.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for [`PackClient`](super::PackClient).
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub(crate) base_url: Url,
    /// Bearer token sent with every request.
    pub(crate) token: SecretString,
    pub(crate) timeout: Duration,
}

impl HttpConfig {
    /// # Errors
    /// Returns `ApiError::Configuration` if the token is empty or the URL does not parse
    /// or cannot carry a path.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ApiError::Configuration("API token cannot be empty".to_string()));
        }

        let base_url = Url::parse(base_url).map_err(|e| {
            ApiError::Configuration(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration(format!(
                "Base URL '{}' cannot have path segments",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn bearer(&self) -> &str {
        self.token.expose_secret()
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded, so ids
    /// containing `/` stay a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::Configuration("Base URL cannot be a 'cannot-be-a-base' URL.".to_string())
            })?
            .pop_if_empty()
            .extend(segments);

        trace!(target: "packsync::api", url = %url, "Built endpoint URL");
        Ok(url)
    }
}
