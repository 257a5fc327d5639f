use std::sync::Arc;

use packsync_core::preview::ObjectUrlTable;
use packsync_extensions::http::PackClient;

pub mod cli;
pub mod commands;
pub mod output;

pub struct AppContext {
    pub client: PackClient,
    /// Local previews for files picked during this run.
    pub previews: Arc<ObjectUrlTable>,
}

impl AppContext {
    pub fn new(client: PackClient) -> Self {
        Self {
            client,
            previews: Arc::new(ObjectUrlTable::new()),
        }
    }

    /// Sign-in page under the configured base URL, keeping any path prefix.
    pub fn login_url(&self) -> String {
        let config = self.client.config();
        config
            .endpoint(&["login"])
            .map(|url| url.to_string())
            .unwrap_or_else(|_| config.base_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use packsync_extensions::http::HttpConfig;

    use super::*;

    fn context(base: &str) -> AppContext {
        let config = HttpConfig::new(base, "token").unwrap();
        AppContext::new(PackClient::new(config).unwrap())
    }

    #[test]
    fn login_url_keeps_the_base_path() {
        assert_eq!(context("https://host/v1").login_url(), "https://host/v1/login");
        assert_eq!(context("https://host/v1/").login_url(), "https://host/v1/login");
        assert_eq!(context("https://host").login_url(), "https://host/login");
    }
}
