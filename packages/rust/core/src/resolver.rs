//! Company name → website resolution.

use tracing::debug;
use url::Url;

use prospector_shared::{ProspectorError, Result};

/// Maps a company name to a candidate website URL.
#[async_trait::async_trait]
pub trait DomainResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String>;
}

/// Guesses `https://www.<slug>.com` from the lower-cased, whitespace-free name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugResolver;

#[async_trait::async_trait]
impl DomainResolver for SlugResolver {
    async fn resolve(&self, name: &str) -> Result<String> {
        let slug: String = name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if slug.is_empty() {
            return Err(ProspectorError::Resolution(format!(
                "cannot derive a domain from '{name}'"
            )));
        }

        let candidate = format!("https://www.{slug}.com");
        Url::parse(&candidate).map_err(|e| {
            ProspectorError::Resolution(format!("'{name}' gives invalid URL {candidate}: {e}"))
        })?;

        Ok(candidate)
    }
}

/// True when `target` already carries an `http://` or `https://` scheme.
pub fn has_scheme(target: &str) -> bool {
    let lower = target.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Website URL for a batch target: URLs pass through, names go to the resolver.
pub async fn resolve_target(resolver: &dyn DomainResolver, target: &str) -> Result<String> {
    if has_scheme(target) {
        return Ok(target.trim().to_string());
    }
    let url = resolver.resolve(target).await?;
    debug!(target, %url, "resolved company name");
    Ok(url)
}
