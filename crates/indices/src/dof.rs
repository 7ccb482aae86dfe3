//! Degree of Fragmentation (DOF)
//!
//! For every barrier, a bidirectional traversal from the barrier's
//! reach scores each reach whose discharge falls inside a window
//! around the barrier's discharge. The score decays with the log-ratio
//! between local and barrier discharge, normalized by the discharge
//! range factor, so a reach one full range factor away scores 0 and
//! the barrier's own reach scores 100. Scores from multiple barriers
//! merge by taking the highest.

use fluvia_core::{Error, LocatedBarrier, NetworkId, Result, RiverNetwork};
use tracing::warn;

/// Smallest admissible discharge range factor. Factors of 1 or less
/// would put a zero (or negative) log in the denominator.
const MIN_RANGE_FACTOR: f64 = 1.000000000000001;

/// Decay function applied along the traversal.
///
/// The numeric modes of the scenario configuration map onto this enum
/// via [`DecayMode::from_mode`]; only mode 1 exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecayMode {
    /// Linear decay of the absolute log10 discharge ratio.
    #[default]
    LogRatio,
}

impl DecayMode {
    /// Resolve a numeric mode from configuration.
    pub fn from_mode(mode: i32) -> Result<Self> {
        match mode {
            1 => Ok(DecayMode::LogRatio),
            other => Err(Error::UnsupportedDecayMode(other)),
        }
    }
}

/// Parameters for the DOF computation
#[derive(Debug, Clone)]
pub struct DofParams {
    pub decay: DecayMode,
    /// Default upstream discharge range factor (5 = half an order of
    /// magnitude).
    pub drf_upstream: f64,
    /// Default downstream discharge range factor.
    pub drf_downstream: f64,
    /// Prefer per-barrier factors over the defaults where present.
    pub per_barrier_factors: bool,
}

impl Default for DofParams {
    fn default() -> Self {
        DofParams {
            decay: DecayMode::LogRatio,
            drf_upstream: 5.0,
            drf_downstream: 5.0,
            per_barrier_factors: false,
        }
    }
}

/// Per-reach DOF values, indexed by `NetworkId::index()`.
#[derive(Debug, Clone)]
pub struct DofResult {
    pub dof: Vec<f64>,
}

/// Compute the DOF for every reach of the network.
///
/// Barriers are processed independently; the max-merge write rule
/// makes the outcome order-independent and idempotent.
pub fn compute_dof(
    network: &RiverNetwork,
    barriers: &[LocatedBarrier],
    params: &DofParams,
) -> DofResult {
    let mut dof = vec![0.0; network.len()];

    for barrier in barriers {
        let (drf_up, drf_down) = range_factors(barrier, params);

        let barrier_discharge = network.reach(barrier.on).discharge_cms;
        if barrier_discharge == 0.0 {
            // No flow to fragment; the barrier's reach is fully
            // fragmented and nothing propagates.
            dof[barrier.on.index()] = 100.0;
            continue;
        }

        let dis_low = barrier_discharge / drf_up;
        let dis_high = barrier_discharge * drf_down;

        upstream_pass(
            network,
            barrier.on,
            barrier_discharge,
            dis_low,
            dis_high,
            drf_up,
            &mut dof,
        );
        downstream_pass(
            network,
            barrier.on,
            barrier_discharge,
            dis_low,
            dis_high,
            drf_down,
            &mut dof,
        );
    }

    DofResult { dof }
}

fn range_factors(barrier: &LocatedBarrier, params: &DofParams) -> (f64, f64) {
    let (up, down) = if params.per_barrier_factors {
        (
            barrier.drf_upstream.unwrap_or(params.drf_upstream),
            barrier.drf_downstream.unwrap_or(params.drf_downstream),
        )
    } else {
        (params.drf_upstream, params.drf_downstream)
    };
    (
        clamp_range_factor(up, "upstream"),
        clamp_range_factor(down, "downstream"),
    )
}

fn clamp_range_factor(value: f64, direction: &str) -> f64 {
    if value <= 1.0 {
        if value < 1.0 {
            warn!(
                value,
                direction, "discharge range factor cannot be lower than 1, clamping"
            );
        }
        MIN_RANGE_FACTOR
    } else {
        value
    }
}

/// Breadth-first walk over the upstream fan-in. The discharge window
/// gates scoring only; traversal continues through out-of-window
/// reaches. Waterfall reaches are neither scored nor crossed.
fn upstream_pass(
    network: &RiverNetwork,
    start: NetworkId,
    barrier_discharge: f64,
    dis_low: f64,
    dis_high: f64,
    drf_up: f64,
    dof: &mut [f64],
) {
    let mut frontier = vec![start];
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &node in &frontier {
            let reach = network.reach(node);
            if reach.has_waterfall {
                continue;
            }
            let local = reach.discharge_cms;
            if local >= dis_low && local <= dis_high {
                let score = upstream_score(local, barrier_discharge, drf_up);
                merge_score(&mut dof[node.index()], score);
            }
            next.extend(network.upstream_of(node));
        }
        frontier = next;
    }
}

/// Single-successor walk toward the sink. No waterfall gating in this
/// direction; the window again gates scoring only.
fn downstream_pass(
    network: &RiverNetwork,
    start: NetworkId,
    barrier_discharge: f64,
    dis_low: f64,
    dis_high: f64,
    drf_down: f64,
    dof: &mut [f64],
) {
    let mut node = Some(start);
    while let Some(current) = node {
        let local = network.reach(current).discharge_cms;
        if local >= dis_low && local <= dis_high {
            let score = downstream_score(local, barrier_discharge, drf_down);
            merge_score(&mut dof[current.index()], score);
        }
        node = network.downstream_of(current);
    }
}

/// Max-merge: a reach keeps the strongest fragmentation effect of all
/// barriers influencing it.
fn merge_score(slot: &mut f64, score: f64) {
    if *slot == 0.0 || score >= *slot {
        *slot = score;
    }
}

/// DOF score for a reach upstream of the barrier.
///
/// Local discharge is capped at the barrier discharge; discharge can
/// increase upstream in braided or data-noisy networks, and the cap
/// keeps the score from exceeding 100.
fn upstream_score(mut discharge_local: f64, discharge_barrier: f64, range_factor: f64) -> f64 {
    if discharge_local > discharge_barrier {
        discharge_local = discharge_barrier;
    }
    log_ratio_score(discharge_local, discharge_barrier, range_factor)
}

/// DOF score for a reach downstream of the barrier. Mirror clamp of
/// the upstream case: local discharge is floored at the barrier
/// discharge.
fn downstream_score(mut discharge_local: f64, discharge_barrier: f64, range_factor: f64) -> f64 {
    if discharge_local < discharge_barrier {
        discharge_local = discharge_barrier;
    }
    log_ratio_score(discharge_local, discharge_barrier, range_factor)
}

fn log_ratio_score(discharge_local: f64, discharge_barrier: f64, range_factor: f64) -> f64 {
    let a = (discharge_local.log10() - discharge_barrier.log10()).abs();
    let x = 100.0 - a * (100.0 / range_factor.log10());
    x.clamp(0.0, 100.0)
}
