//! ICP confidence scoring.
//!
//! Each criterion contributes its weight to the denominator only when it is
//! applicable. Industry and geography are applicable when the ICP names at
//! least one value; size fit, contactability and hiring signal always are.
//! The score is `round(100 * awarded / applicable)`, or 0 with nothing applicable.

use serde::Serialize;

use prospector_shared::{ExtractedCompany, IcpCriteria};

pub const INDUSTRY_WEIGHT: u32 = 30;
pub const GEOGRAPHY_WEIGHT: u32 = 20;
pub const SIZE_WEIGHT: u32 = 20;
pub const CONTACT_WEIGHT: u32 = 15;
pub const HIRING_WEIGHT: u32 = 15;

/// One scoring dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Industry,
    Geography,
    SizeFit,
    Contactability,
    HiringSignal,
}

/// How a single criterion fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CriterionOutcome {
    pub criterion: Criterion,
    pub weight: u32,
    pub applicable: bool,
    pub awarded: bool,
}

/// Per-criterion outcomes for one company against one ICP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub outcomes: Vec<CriterionOutcome>,
}

impl ScoreBreakdown {
    /// Sum of weights awarded.
    pub fn awarded(&self) -> u32 {
        self.outcomes
            .iter()
            .filter(|o| o.applicable && o.awarded)
            .map(|o| o.weight)
            .sum()
    }

    /// Sum of weights that could have been awarded.
    pub fn max_score(&self) -> u32 {
        self.outcomes
            .iter()
            .filter(|o| o.applicable)
            .map(|o| o.weight)
            .sum()
    }

    /// Normalized 0–100 confidence.
    pub fn confidence(&self) -> u8 {
        let max = self.max_score();
        if max == 0 {
            return 0;
        }
        // Round half up: (2 * 100 * s + max) / (2 * max)
        let pct = (200 * self.awarded() + max) / (2 * max);
        pct.min(100) as u8
    }
}

/// Confidence (0–100) that `company` fits `icp`.
pub fn score(company: &ExtractedCompany, icp: &IcpCriteria) -> u8 {
    score_breakdown(company, icp).confidence()
}

/// Evaluate every criterion for `company` against `icp`.
pub fn score_breakdown(company: &ExtractedCompany, icp: &IcpCriteria) -> ScoreBreakdown {
    let industry = CriterionOutcome {
        criterion: Criterion::Industry,
        weight: INDUSTRY_WEIGHT,
        applicable: !icp.industries.is_empty(),
        awarded: matches_any(company.industry.as_deref(), &icp.industries),
    };

    let geography = CriterionOutcome {
        criterion: Criterion::Geography,
        weight: GEOGRAPHY_WEIGHT,
        applicable: !icp.geographies.is_empty(),
        awarded: matches_any(company.location.as_deref(), &icp.geographies),
    };

    let size_fit = CriterionOutcome {
        criterion: Criterion::SizeFit,
        weight: SIZE_WEIGHT,
        applicable: true,
        awarded: company.employee_count.is_some_and(|count| {
            let min = icp.company_size_min.unwrap_or(0);
            let max = icp.company_size_max.unwrap_or(u64::MAX);
            (min..=max).contains(&count)
        }),
    };

    let contactability = CriterionOutcome {
        criterion: Criterion::Contactability,
        weight: CONTACT_WEIGHT,
        applicable: true,
        awarded: is_present(company.contact_email.as_deref())
            || is_present(company.contact_phone.as_deref()),
    };

    let hiring = CriterionOutcome {
        criterion: Criterion::HiringSignal,
        weight: HIRING_WEIGHT,
        applicable: true,
        awarded: !company.hiring_signals.is_empty(),
    };

    ScoreBreakdown {
        outcomes: vec![industry, geography, size_fit, contactability, hiring],
    }
}

/// True when any needle is a case-insensitive substring of `haystack`.
fn matches_any(haystack: Option<&str>, needles: &[String]) -> bool {
    let Some(haystack) = haystack else {
        return false;
    };
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
