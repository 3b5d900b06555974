//! Core domain types for ICP enrichment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProspectorError, Result};

// ---------------------------------------------------------------------------
// IcpCriteria
// ---------------------------------------------------------------------------

/// Ideal Customer Profile a batch of companies is matched against.
///
/// Every dimension is optional; an empty profile is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcpCriteria {
    /// Target industries, matched case-insensitively as substrings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub industries: Vec<String>,
    /// Target geographies, matched case-insensitively as substrings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geographies: Vec<String>,
    /// Smallest acceptable headcount (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size_min: Option<u64>,
    /// Largest acceptable headcount (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size_max: Option<u64>,
    /// Free-text keywords describing the profile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl IcpCriteria {
    /// Reject a size range whose lower bound exceeds its upper bound.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.company_size_min, self.company_size_max) {
            if min > max {
                return Err(ProspectorError::validation(format!(
                    "company_size_min {min} exceeds company_size_max {max}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ExtractedCompany
// ---------------------------------------------------------------------------

/// Structured facts about one company, as produced by extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCompany {
    /// Company name. Never empty.
    pub name: String,
    /// Origin URL the facts were extracted from.
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Approximate headcount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<u64>,
    /// One or two sentence summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    /// Phrases suggesting the company is growing its team.
    #[serde(default)]
    pub hiring_signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

impl ExtractedCompany {
    /// Minimal record carrying only a name and the website.
    pub fn minimal(name: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: website.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// EnrichmentResult
// ---------------------------------------------------------------------------

/// One scored company, handed to the caller at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    #[serde(flatten)]
    pub company: ExtractedCompany,
    /// Match quality against the ICP, 0–100.
    pub confidence: u8,
    /// Input string (name or URL) this result was derived from.
    pub target: String,
    pub enriched_at: DateTime<Utc>,
}
