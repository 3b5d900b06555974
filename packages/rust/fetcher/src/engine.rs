//! Best-effort page retrieval through a proxy.
//!
//! Every failure mode (bad URL, transport error, non-2xx, unreadable body)
//! collapses into empty content; callers never see an error from this stage.

use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use prospector_shared::{FetchConfig, ProspectorError, Result};

use crate::ContentSource;
use crate::text::html_to_text;

/// HTTP content source that routes requests through a retrieval proxy.
pub struct HttpFetcher {
    config: FetchConfig,
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Fetch `url` and return its visible text, or an error describing why not.
    async fn try_fetch(&self, url: &str) -> Result<String> {
        let target = Url::parse(url.trim())
            .map_err(|e| ProspectorError::Network(format!("invalid URL '{url}': {e}")))?;
        let request_url = proxied_url(&self.config.proxy_prefix, &target);

        debug!(%request_url, "fetching page");

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| ProspectorError::Network(format!("{target}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProspectorError::Network(format!("{target}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProspectorError::Network(format!("{target}: body read failed: {e}")))?;

        Ok(html_to_text(&body, self.config.max_content_chars))
    }
}

#[async_trait::async_trait]
impl ContentSource for HttpFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(text) => {
                debug!(chars = text.chars().count(), "page fetched");
                text
            }
            Err(e) => {
                warn!(error = %e, "fetch failed, continuing with empty content");
                String::new()
            }
        }
    }
}

/// Build the request URL: proxy prefix + percent-encoded target, or the target itself.
fn proxied_url(proxy_prefix: &str, target: &Url) -> String {
    if proxy_prefix.is_empty() {
        return target.to_string();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();
    format!("{proxy_prefix}{encoded}")
}
