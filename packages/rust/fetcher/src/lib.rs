//! Content acquisition for enrichment.
//!
//! This crate provides:
//! - [`ContentSource`]: the "URL in, plain text out" seam the pipeline drives
//! - [`HttpFetcher`]: proxy-routed HTTP implementation
//! - [`html_to_text`]: markup stripping and length capping

mod engine;
mod text;

pub use engine::HttpFetcher;
pub use text::html_to_text;

/// Source of page content for a URL.
///
/// Implementations never fail: any problem is reported as empty content.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Return best-effort plain text for `url`, possibly empty.
    async fn fetch(&self, url: &str) -> String;
}
