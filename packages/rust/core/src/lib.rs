//! Core enrichment pipeline for Prospector.
//!
//! This crate ties content retrieval, structured extraction and ICP scoring
//! together into ranked batch runs (see [`pipeline::Pipeline`]).

pub mod pacing;
pub mod pipeline;
pub mod resolver;
pub mod scoring;

pub use pipeline::{BatchProgress, BatchReport, Pipeline, SilentProgress, SkippedTarget};
pub use resolver::{DomainResolver, SlugResolver};
pub use scoring::{ScoreBreakdown, score, score_breakdown};
