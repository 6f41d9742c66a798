//! Concentration, risk and activity metrics over repository history.
//!
//! Every function here is pure and total: degenerate input (no entities,
//! zero weight, zero normalization denominator) resolves to a documented
//! neutral value instead of an error, so results can be computed for many
//! scopes in parallel without coordination.

pub mod activity;
pub mod bus_factor;
pub mod distribution;
pub mod knowledge;
pub mod ownership;
pub mod refactoring;
pub mod risk;
