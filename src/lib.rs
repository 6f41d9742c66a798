//! Repository evolution analytics.
//!
//! Strata turns the per-tick output of a history analysis into the numbers
//! behind ownership, hotspot and growth charts:
//! - [`metrics`]: Gini, HHI, bus factor, composite risk, knowledge
//!   diffusion, refactoring phases and temporal activity
//! - [`timeline`]: tick-to-calendar mapping and calendar resampling of
//!   cumulative series
//! - [`report`]: one call that runs all of the above over a JSON snapshot
//!
//! # Examples
//!
//! ```
//! use strata::{analyze, AnalysisInput, StrataConfig};
//!
//! let input = AnalysisInput::from_json(r#"{
//!     "ownershipSnapshots": { "3": [50, 30, 10, 10] },
//!     "riskFactors": [
//!         { "path": "src/lib.rs", "size": 900, "churn": 12, "couplingDegree": 4, "ownershipGini": 0.7 }
//!     ]
//! }"#).unwrap();
//!
//! let report = analyze(&input, &StrataConfig::default()).unwrap();
//! assert_eq!(report.bus_factor.current, 3);
//! assert_eq!(report.risk.annotated, vec!["src/lib.rs".to_string()]);
//! ```

pub mod report;

pub use strata_core::{
    ContributionRecord, Granularity, OwnershipDistribution, ResamplePeriod, Result, RiskFactor,
    RiskWeights, StrataConfig, StrataError,
};
pub use strata_metrics as metrics;
pub use strata_timeline as timeline;

pub use report::{analyze, AnalysisInput, Report};
