//! Shared types, error model, and configuration for Prospector.
//!
//! This crate is the foundation depended on by all other Prospector crates.
//! It provides:
//! - [`ProspectorError`]: the unified error type
//! - Domain types ([`IcpCriteria`], [`ExtractedCompany`], [`EnrichmentResult`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`PacingConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, FetchSection, OpenRouterConfig, PacingConfig, PacingSection,
    api_key, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{ProspectorError, Result};
pub use types::{EnrichmentResult, ExtractedCompany, IcpCriteria};
