//! Structured extraction of company facts from page text.
//!
//! [`Extractor::extract`] never fails: when there is no content, or the
//! injected [`StructuredGenerator`] errors or returns something off-schema,
//! it degrades to a minimal record named after the website's host.

mod llm;
mod prompt;

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use prospector_shared::{ExtractedCompany, Result};

pub use llm::{ChatMessage, OpenRouterClient, OutputSchema, Role, StructuredGenerator};

/// Turns page text into an [`ExtractedCompany`] using a structured generator.
#[derive(Clone)]
pub struct Extractor {
    generator: Arc<dyn StructuredGenerator>,
}

impl Extractor {
    pub fn new(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { generator }
    }

    /// Extract a company record from `content` fetched at `source_url`.
    #[instrument(skip_all, fields(url = %source_url, chars = content.chars().count()))]
    pub async fn extract(&self, content: &str, source_url: &str) -> ExtractedCompany {
        if content.trim().is_empty() {
            debug!("no content, using fallback record");
            return fallback_company(source_url);
        }

        match self.try_extract(content, source_url).await {
            Ok(company) => company,
            Err(e) => {
                warn!(error = %e, "extraction failed, using fallback record");
                fallback_company(source_url)
            }
        }
    }

    async fn try_extract(&self, content: &str, source_url: &str) -> Result<ExtractedCompany> {
        let messages = prompt::build_messages(content, source_url);
        let schema = prompt::company_schema();

        let value = self.generator.generate_structured(&messages, &schema).await?;
        prompt::parse_company(value, source_url)
    }
}

/// Minimal record for `source_url`: host-derived name, website, nothing else.
pub fn fallback_company(source_url: &str) -> ExtractedCompany {
    ExtractedCompany::minimal(host_name(source_url), source_url)
}

/// Host of `url` without a leading `www.`.
///
/// Falls back to the trimmed input, then to `"unknown"`, so the result is never empty.
pub fn host_name(url: &str) -> String {
    let host = Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h))
        .filter(|h| !h.is_empty());

    match host {
        Some(h) => h,
        None if !url.trim().is_empty() => url.trim().to_string(),
        None => "unknown".to_string(),
    }
}
