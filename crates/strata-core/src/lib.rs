//! Core types, configuration, and error handling for Strata.
//!
//! This crate provides the shared foundation used by the other Strata crates:
//! - [`StrataError`]: unified error type using `thiserror` and `miette`
//! - [`StrataConfig`]: analysis parameters loaded from `.strata.toml`
//! - Shared data model: [`ContributionRecord`], [`OwnershipDistribution`],
//!   [`RiskFactor`], [`Granularity`], [`ResamplePeriod`]

mod config;
mod error;
mod types;

pub use config::{
    BusFactorConfig, KnowledgeConfig, RefactoringConfig, RiskConfig, RiskWeights, StrataConfig,
    TimelineConfig,
};
pub use error::StrataError;
pub use types::{ContributionRecord, Granularity, OwnershipDistribution, ResamplePeriod, RiskFactor};

/// A convenience `Result` type for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
