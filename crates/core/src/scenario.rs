//! Scenario configuration
//!
//! A scenario is a named weighting of the six pressure indicators fed
//! into the CSI, together with the thresholds steering the status and
//! filter stages. Scenarios are pure configuration values owned by the
//! caller and passed by reference into the engines.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed order of the six pressure indicators in a scenario.
pub const PRESSURE_FIELD_COUNT: usize = 6;

/// One CSI weighting scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, used to label output columns and summary rows.
    pub name: String,
    /// Names of the six pressure indicators, in engine order
    /// [DOF, DOR, SED, USE, RDD, URB]. Informational.
    #[serde(default = "default_fields")]
    pub fields: [String; PRESSURE_FIELD_COUNT],
    /// Weights for the six indicators, expressed as whole percentages.
    pub weights: [f64; PRESSURE_FIELD_COUNT],
    /// CSI threshold separating free-flowing from impacted reaches.
    #[serde(default = "default_csi_threshold")]
    pub csi_threshold: f64,
    /// Floodplain damping factor applied to road and urban pressures.
    #[serde(default = "default_flood_weight")]
    pub flood_weight: f64,
    /// Volume-percent threshold for the dissolve noise filter.
    #[serde(default = "default_filter_threshold")]
    pub filter_threshold: f64,
    /// Process this scenario.
    #[serde(default = "default_true")]
    pub to_process: bool,
    /// Export reach-level results for this scenario.
    #[serde(default = "default_true")]
    pub to_export: bool,
}

fn default_fields() -> [String; PRESSURE_FIELD_COUNT] {
    ["DOF", "DOR", "SED", "USE", "RDD", "URB"].map(String::from)
}

fn default_csi_threshold() -> f64 {
    95.0
}

fn default_flood_weight() -> f64 {
    50.0
}

fn default_filter_threshold() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            name: "CSI".to_string(),
            fields: default_fields(),
            weights: [100.0 / 6.0; PRESSURE_FIELD_COUNT],
            csi_threshold: default_csi_threshold(),
            flood_weight: default_flood_weight(),
            filter_threshold: default_filter_threshold(),
            to_process: true,
            to_export: true,
        }
    }
}

impl Scenario {
    /// Validate the scenario before any engine runs.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Configuration("scenario name is empty".into()));
        }
        for (i, w) in self.weights.iter().enumerate() {
            if !w.is_finite() || *w < 0.0 {
                return Err(Error::Configuration(format!(
                    "scenario {}: weight {} is {} (must be a non-negative percentage)",
                    self.name,
                    i + 1,
                    w
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.csi_threshold) {
            return Err(Error::Configuration(format!(
                "scenario {}: CSI threshold {} outside [0, 100]",
                self.name, self.csi_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.flood_weight) {
            return Err(Error::Configuration(format!(
                "scenario {}: floodplain weight {} outside [0, 100]",
                self.name, self.flood_weight
            )));
        }
        if !self.filter_threshold.is_finite() || self.filter_threshold < 0.0 {
            return Err(Error::Configuration(format!(
                "scenario {}: filter threshold {} must be non-negative",
                self.name, self.filter_threshold
            )));
        }
        Ok(())
    }
}

/// Run-level settings shared by all scenarios of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Default upstream discharge range factor for DOF.
    #[serde(default = "default_drf")]
    pub drf_upstream: f64,
    /// Default downstream discharge range factor for DOF.
    #[serde(default = "default_drf")]
    pub drf_downstream: f64,
    /// Use per-barrier discharge range factors where present.
    #[serde(default)]
    pub use_barrier_level_factors: bool,
    /// Numeric DOF decay mode; only mode 1 (log-ratio) is supported.
    #[serde(default = "default_decay_mode")]
    pub decay_mode: i32,
}

fn default_drf() -> f64 {
    5.0
}

fn default_decay_mode() -> i32 {
    1
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            drf_upstream: default_drf(),
            drf_downstream: default_drf(),
            use_barrier_level_factors: false,
            decay_mode: default_decay_mode(),
        }
    }
}

impl RunSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("drf_upstream", self.drf_upstream),
            ("drf_downstream", self.drf_downstream),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::Configuration(format!(
                    "{name} must be a positive number, got {v}"
                )));
            }
        }
        Ok(())
    }
}
