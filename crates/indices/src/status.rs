//! Free-flowing river status
//!
//! Post-processes per-reach CSI threshold flags into contiguous river
//! stretches and a status class per reach. The pipeline dissolves the
//! network into stretches of uniform (backbone, flag), filters out
//! stretches whose impacted water volume is negligible for their
//! backbone river, re-dissolves with the filtered flags, and finally
//! classifies each backbone river by how much of its length remains
//! free-flowing.

use std::collections::{HashMap, HashSet};

use fluvia_core::{NetworkId, RiverNetwork, Scenario};
use tracing::debug;

/// A backbone river counts as fully free-flowing when at least this
/// share of its length is above the CSI threshold. Slightly below 100
/// to absorb floating-point length sums.
const FULL_LENGTH_PCT: f64 = 99.999;

/// Free-flowing status of a reach, three categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Part of a river that is free-flowing over its whole length.
    FreeFlowing,
    /// Above the CSI threshold itself, but on a partially impacted
    /// river ("good connectivity status").
    GoodConnectivity,
    /// Below the CSI threshold.
    Impacted,
}

impl FlowStatus {
    /// Three-category numeric code (1, 2, 3).
    pub fn code(self) -> u8 {
        match self {
            FlowStatus::FreeFlowing => 1,
            FlowStatus::GoodConnectivity => 2,
            FlowStatus::Impacted => 3,
        }
    }

    /// Two-category numeric code: free-flowing (1) or not (3). The
    /// good-connectivity class folds into "not free-flowing".
    pub fn code_two(self) -> u8 {
        match self {
            FlowStatus::FreeFlowing => 1,
            _ => 3,
        }
    }
}

/// Per-reach status outputs, indexed by `NetworkId::index()`.
#[derive(Debug, Clone)]
pub struct StatusResult {
    /// Stretch id per reach, from the post-filter dissolve. Unique
    /// across the network, starting at 1.
    pub stretch_id: Vec<u32>,
    /// Status per reach.
    pub status: Vec<FlowStatus>,
}

/// Classify every reach, starting from the CSI threshold flags.
///
/// The reach-level CSI values are not an input here: only the flags
/// matter, and the volume filter flips flags on a working copy. The
/// caller's CSI values stay untouched.
pub fn compute_status(
    network: &RiverNetwork,
    above_threshold: &[bool],
    scenario: &Scenario,
) -> StatusResult {
    let mut flags = above_threshold.to_vec();

    // First dissolve finds the candidate stretches for filtering.
    let stretches = dissolve(network, &flags);
    let to_filter = volume_filter(network, &flags, &stretches, scenario.filter_threshold);
    debug!(
        scenario = %scenario.name,
        filtered = to_filter.len(),
        "noise filter selected stretches"
    );
    for i in 0..network.len() {
        if to_filter.contains(&stretches[i]) {
            flags[i] = true;
        }
    }

    // Second dissolve merges the filtered stretches into their
    // free-flowing neighbors.
    let stretch_id = dissolve(network, &flags);

    let status = classify(network, &flags, &stretch_id);

    StatusResult { stretch_id, status }
}

/// Partition the network into stretches of uniform (backbone, flag).
///
/// Walks breadth-first from every sink toward the headwaters. An
/// upstream neighbor joins the current stretch when it carries the
/// same backbone id and threshold flag, and opens a new stretch
/// otherwise. Ids are unique across the whole network.
pub fn dissolve(network: &RiverNetwork, flags: &[bool]) -> Vec<u32> {
    let mut stretch = vec![0u32; network.len()];
    let mut next_id = 0u32;

    for sink in network.sinks() {
        next_id += 1;
        stretch[sink.index()] = next_id;

        let mut nodes = vec![sink];
        while !nodes.is_empty() {
            let mut front = Vec::new();
            for &node in &nodes {
                let key = stretch_key(network, flags, node);
                let id = stretch[node.index()];
                for up in network.upstream_of(node) {
                    if stretch_key(network, flags, up) == key {
                        stretch[up.index()] = id;
                    } else {
                        next_id += 1;
                        stretch[up.index()] = next_id;
                    }
                    front.push(up);
                }
            }
            nodes = front;
        }
    }

    stretch
}

fn stretch_key(network: &RiverNetwork, flags: &[bool], id: NetworkId) -> (u64, bool) {
    (network.reach(id).backbone_id, flags[id.index()])
}

/// Stretch ids whose impacted volume share of the backbone river is
/// below the threshold.
///
/// Small impacted stretches on large rivers are usually data noise
/// rather than real fragmentation; their flags are flipped before the
/// final dissolve.
fn volume_filter(
    network: &RiverNetwork,
    flags: &[bool],
    stretches: &[u32],
    pct_threshold: f64,
) -> HashSet<u32> {
    struct Group {
        volume_tcm: f64,
        bb_volume_tcm: f64,
    }

    let mut groups: HashMap<u32, Group> = HashMap::new();
    for (i, reach) in network.reaches().iter().enumerate() {
        if flags[i] {
            continue;
        }
        let group = groups.entry(stretches[i]).or_insert(Group {
            volume_tcm: 0.0,
            bb_volume_tcm: reach.bb_volume_tcm,
        });
        group.volume_tcm += reach.volume_tcm;
    }

    groups
        .into_iter()
        .filter(|(_, g)| {
            g.bb_volume_tcm > 0.0 && (g.volume_tcm / g.bb_volume_tcm) * 100.0 < pct_threshold
        })
        .map(|(id, _)| id)
        .collect()
}

/// Assign a status to every reach from the final stretches.
fn classify(network: &RiverNetwork, flags: &[bool], stretches: &[u32]) -> Vec<FlowStatus> {
    struct Group {
        length_km: f64,
        bb_length_km: f64,
        flag: bool,
    }

    let mut groups: HashMap<u32, Group> = HashMap::new();
    for (i, reach) in network.reaches().iter().enumerate() {
        let group = groups.entry(stretches[i]).or_insert(Group {
            length_km: 0.0,
            bb_length_km: reach.bb_length_km,
            flag: flags[i],
        });
        group.length_km += reach.length_km;
    }

    let status_of: HashMap<u32, FlowStatus> = groups
        .into_iter()
        .map(|(id, g)| {
            let status = if g.flag {
                let pct_ff = if g.bb_length_km > 0.0 {
                    (g.length_km / g.bb_length_km) * 100.0
                } else {
                    0.0
                };
                if pct_ff >= FULL_LENGTH_PCT {
                    FlowStatus::FreeFlowing
                } else {
                    FlowStatus::GoodConnectivity
                }
            } else {
                FlowStatus::Impacted
            };
            (id, status)
        })
        .collect();

    stretches
        .iter()
        .map(|id| status_of[id])
        .collect()
}
