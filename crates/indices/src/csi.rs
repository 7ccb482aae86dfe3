//! Connectivity Status Index (CSI) and dominant pressure
//!
//! Weighted overlay of the six pressure indicators [DOF, DOR, SED,
//! USE, RDD, URB]. Road and urban pressures are amplified on
//! floodplain reaches before weighting. The operation order
//! (floodplain adjust, unit-correct urban, clamp, weight, noise-snap,
//! sum) is fixed; changing it changes the numbers.

use fluvia_core::Scenario;
use serde::{Deserialize, Serialize};

/// Weighted values below this are treated as noise and zeroed.
const NOISE_FLOOR: f64 = 0.1;

/// The pressure indicator dominating a reach's CSI.
///
/// Ties resolve to the earliest indicator in engine order, which
/// structurally favours DOF over DOR and road over urban pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dominance {
    Dof,
    Dor,
    Sed,
    LandUse,
    Road,
    Urban,
    /// All six weighted pressures are zero.
    None,
}

impl Dominance {
    const ORDERED: [Dominance; 6] = [
        Dominance::Dof,
        Dominance::Dor,
        Dominance::Sed,
        Dominance::LandUse,
        Dominance::Road,
        Dominance::Urban,
    ];

    /// Short label used in output tables ("NAN" for no dominant
    /// pressure, matching the upstream datasets).
    pub fn label(self) -> &'static str {
        match self {
            Dominance::Dof => "DOF",
            Dominance::Dor => "DOR",
            Dominance::Sed => "SED",
            Dominance::LandUse => "USE",
            Dominance::Road => "RDD",
            Dominance::Urban => "URB",
            Dominance::None => "NAN",
        }
    }
}

/// Pressure indicator values of one reach going into the CSI.
#[derive(Debug, Clone, Copy, Default)]
pub struct PressureInputs {
    pub dof: f64,
    pub dor: f64,
    pub sed: f64,
    pub land_use: f64,
    pub road: f64,
    /// Urban extent as a fraction; unit-corrected to percent inside
    /// the engine.
    pub urban: f64,
    /// Percent of the reach catchment covered by floodplains.
    pub floodplain_pct: f64,
}

/// Per-reach CSI outputs, indexed like the input slice.
#[derive(Debug, Clone)]
pub struct CsiResult {
    /// CSI in percent, rounded to 5 decimal places.
    pub csi: Vec<f64>,
    /// Dominant pressure per reach.
    pub dominant: Vec<Dominance>,
    /// Reach meets or exceeds the scenario's CSI threshold.
    pub above_threshold: Vec<bool>,
}

/// Compute CSI, dominance and the threshold flag for every reach.
pub fn compute_csi(inputs: &[PressureInputs], scenario: &Scenario) -> CsiResult {
    let mut csi = Vec::with_capacity(inputs.len());
    let mut dominant = Vec::with_capacity(inputs.len());
    let mut above_threshold = Vec::with_capacity(inputs.len());

    for p in inputs {
        let weighted = weighted_pressures(p, scenario);
        let sum: f64 = weighted.iter().sum();

        let value = round5(100.0 - sum / 100.0);
        csi.push(value);
        above_threshold.push(value >= scenario.csi_threshold);
        dominant.push(dominant_pressure(&weighted, sum));
    }

    CsiResult {
        csi,
        dominant,
        above_threshold,
    }
}

/// The six weighted pressure values of one reach, in engine order.
fn weighted_pressures(p: &PressureInputs, scenario: &Scenario) -> [f64; 6] {
    let floodplain = p.floodplain_pct / 100.0;
    let damping = scenario.flood_weight / 100.0;

    // Floodplain weighting applies to road and urban pressure only
    let mut road = p.road + p.road * floodplain * damping;
    let mut urban = p.urban + p.urban * floodplain * damping;

    // Urban extent arrives as a fraction; bring it to percent
    urban *= 100.0;

    // The floodplain boost can overshoot the percent scale
    if road > 100.0 {
        road = 100.0;
    }
    if urban > 100.0 {
        urban = 100.0;
    }

    let mut weighted = [
        p.dof * scenario.weights[0],
        p.dor * scenario.weights[1],
        p.sed * scenario.weights[2],
        p.land_use * scenario.weights[3],
        road * scenario.weights[4],
        urban * scenario.weights[5],
    ];
    for v in &mut weighted {
        if *v < NOISE_FLOOR {
            *v = 0.0;
        }
    }
    weighted
}

/// Stable argmax over the weighted values; all-zero reaches have no
/// dominant pressure.
fn dominant_pressure(weighted: &[f64; 6], sum: f64) -> Dominance {
    if sum == 0.0 {
        return Dominance::None;
    }
    let mut best = 0;
    for i in 1..6 {
        if weighted[i] > weighted[best] {
            best = i;
        }
    }
    Dominance::ORDERED[best]
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}
