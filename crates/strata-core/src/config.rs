use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;
use crate::types::Granularity;

/// Top-level configuration loaded from `.strata.toml`.
///
/// Only analysis parameters live here. Presentation options (figure size,
/// colours, fonts) belong to the renderer and never reach the metrics.
///
/// # Examples
///
/// ```
/// use strata_core::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.bus_factor.threshold, 0.8);
/// assert_eq!(config.risk.top_n, 20);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Bus factor settings.
    #[serde(default)]
    pub bus_factor: BusFactorConfig,
    /// Hotspot risk settings.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Knowledge diffusion settings.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Refactoring phase detection settings.
    #[serde(default)]
    pub refactoring: RefactoringConfig,
    /// Time series settings.
    #[serde(default)]
    pub timeline: TimelineConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if `path` does not exist,
    /// [`StrataError::Io`] if it cannot be read, [`StrataError::Toml`] if the
    /// content is not valid TOML and [`StrataError::Config`] if a value is
    /// out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use strata_core::StrataConfig;
    /// use std::path::Path;
    ///
    /// let config = StrataConfig::from_file(Path::new(".strata.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, StrataError> {
        if !path.exists() {
            return Err(StrataError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Toml`] if parsing fails, or
    /// [`StrataError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::{Granularity, StrataConfig};
    ///
    /// let toml = r#"
    /// [bus_factor]
    /// threshold = 0.5
    ///
    /// [timeline]
    /// granularity = "week"
    /// "#;
    /// let config = StrataConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.bus_factor.threshold, 0.5);
    /// assert_eq!(config.timeline.granularity, Granularity::Week);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, StrataError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] naming the offending key.
    pub fn validate(&self) -> Result<(), StrataError> {
        check_fraction("bus_factor.threshold", self.bus_factor.threshold)?;
        check_fraction("refactoring.threshold", self.refactoring.threshold)?;

        if self.risk.top_n == 0 {
            return Err(StrataError::Config(
                "risk.top_n must be 1 or greater".into(),
            ));
        }
        if self.knowledge.window_months == 0 {
            return Err(StrataError::Config(
                "knowledge.window_months must be 1 or greater".into(),
            ));
        }

        let w = &self.risk.weights;
        for (name, value) in [
            ("size", w.size),
            ("churn", w.churn),
            ("coupling", w.coupling),
            ("ownership", w.ownership),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StrataError::Config(format!(
                    "risk.weights.{name} must be a finite number >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn check_fraction(key: &str, value: f64) -> Result<(), StrataError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(StrataError::Config(format!(
            "{key} must be in (0, 1], got {value}"
        )))
    }
}

/// Bus factor configuration.
///
/// # Examples
///
/// ```
/// use strata_core::BusFactorConfig;
///
/// assert_eq!(BusFactorConfig::default().threshold, 0.8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusFactorConfig {
    /// Ownership share the top contributors must cover (default: 0.8).
    #[serde(default = "default_bus_factor_threshold")]
    pub threshold: f64,
}

fn default_bus_factor_threshold() -> f64 {
    0.8
}

impl Default for BusFactorConfig {
    fn default() -> Self {
        Self {
            threshold: default_bus_factor_threshold(),
        }
    }
}

/// Hotspot risk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Churn window in days, reported alongside the ranking (default: 90).
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Rows in the tabular summary (default: 20).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Files annotated on the bubble chart (default: 5).
    #[serde(default = "default_annotate_top")]
    pub annotate_top: usize,
    /// Exponent applied to each normalized factor.
    #[serde(default)]
    pub weights: RiskWeights,
}

fn default_window_days() -> u32 {
    90
}

fn default_top_n() -> usize {
    20
}

fn default_annotate_top() -> usize {
    5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            top_n: default_top_n(),
            annotate_top: default_annotate_top(),
            weights: RiskWeights::default(),
        }
    }
}

/// Per-factor exponents for the composite risk product.
///
/// All `1.0` (the default) is the plain product of the four factors.
///
/// # Examples
///
/// ```
/// use strata_core::RiskWeights;
///
/// let w = RiskWeights::default();
/// assert_eq!((w.size, w.churn, w.coupling, w.ownership), (1.0, 1.0, 1.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Exponent on the log-normalized size.
    #[serde(default = "default_weight")]
    pub size: f64,
    /// Exponent on the normalized churn.
    #[serde(default = "default_weight")]
    pub churn: f64,
    /// Exponent on the normalized coupling degree.
    #[serde(default = "default_weight")]
    pub coupling: f64,
    /// Exponent on the ownership Gini.
    #[serde(default = "default_weight")]
    pub ownership: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            size: default_weight(),
            churn: default_weight(),
            coupling: default_weight(),
            ownership: default_weight(),
        }
    }
}

/// Knowledge diffusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Window in months for counting recent editors (default: 6).
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    /// Number of silo files to report (default: 30).
    #[serde(default = "default_max_silos")]
    pub max_silos: usize,
}

fn default_window_months() -> u32 {
    6
}

fn default_max_silos() -> usize {
    30
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            window_months: default_window_months(),
            max_silos: default_max_silos(),
        }
    }
}

/// Refactoring phase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactoringConfig {
    /// Rename ratio at or above which a tick is a refactoring phase (default: 0.3).
    #[serde(default = "default_refactoring_threshold")]
    pub threshold: f64,
}

fn default_refactoring_threshold() -> f64 {
    0.3
}

impl Default for RefactoringConfig {
    fn default() -> Self {
        Self {
            threshold: default_refactoring_threshold(),
        }
    }
}

/// Time series configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Reporting grid for cumulative series (default: month).
    #[serde(default)]
    pub granularity: Granularity,
}
