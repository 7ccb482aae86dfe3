//! Summary statistics over reach-level results
//!
//! Aggregates one scenario's CSI output into the network-wide summary
//! row, the dominant-pressure tally, and the benchmark-river match
//! count. Only reaches flagged as included enter any of the
//! aggregates.

use std::collections::HashMap;

use fluvia_core::io::BenchmarkEntry;
use fluvia_core::RiverNetwork;
use serde::Serialize;

use crate::csi::{CsiResult, Dominance};

/// Reaches at or above this CSI count as unimpacted. Sits just below
/// 100 so values rounded to 5 decimals do not fall on the wrong side.
const UNIMPACTED_CUTOFF: f64 = 99.99999999999999;

/// One summary row of network-wide CSI statistics for a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    /// Scenario name.
    pub scenario: String,
    /// Included reaches.
    pub reach_count: usize,
    /// Included reaches with CSI below 100.
    pub impacted_count: usize,
    /// Share of included reaches with CSI below 100, in percent.
    pub impacted_pct: f64,
    /// Mean CSI over the impacted reaches.
    pub impacted_mean_csi: f64,
    /// Included reaches below the scenario's CSI threshold.
    pub below_threshold_count: usize,
    /// Share of included reaches below the threshold, in percent.
    pub below_threshold_pct: f64,
}

/// Aggregate the summary row for one scenario.
pub fn global_stats(
    network: &RiverNetwork,
    result: &CsiResult,
    scenario_name: &str,
) -> GlobalStats {
    let mut reach_count = 0usize;
    let mut impacted_count = 0usize;
    let mut impacted_sum = 0.0;
    let mut below_threshold_count = 0usize;

    for (i, reach) in network.reaches().iter().enumerate() {
        if !reach.included {
            continue;
        }
        reach_count += 1;
        let csi = result.csi[i];
        if csi < UNIMPACTED_CUTOFF {
            impacted_count += 1;
            impacted_sum += csi;
        }
        if !result.above_threshold[i] {
            below_threshold_count += 1;
        }
    }

    let pct = |part: usize| {
        if reach_count == 0 {
            0.0
        } else {
            round1(100.0 * part as f64 / reach_count as f64)
        }
    };
    let impacted_mean_csi = if impacted_count == 0 {
        0.0
    } else {
        round1(impacted_sum / impacted_count as f64)
    };

    GlobalStats {
        scenario: scenario_name.to_string(),
        reach_count,
        impacted_count,
        impacted_pct: pct(impacted_count),
        impacted_mean_csi,
        below_threshold_count,
        below_threshold_pct: pct(below_threshold_count),
    }
}

/// One row of the dominant-pressure tally.
#[derive(Debug, Clone, Serialize)]
pub struct DominanceCount {
    pub scenario: String,
    /// Pressure label ("DOF", "DOR", ...).
    pub pressure: &'static str,
    /// Included below-threshold reaches dominated by this pressure.
    pub count: usize,
}

/// Tally the dominant pressure over included reaches below the CSI
/// threshold, sorted by pressure label.
pub fn dominance_counts(
    network: &RiverNetwork,
    result: &CsiResult,
    scenario_name: &str,
) -> Vec<DominanceCount> {
    let mut counts: HashMap<Dominance, usize> = HashMap::new();
    for (i, reach) in network.reaches().iter().enumerate() {
        if reach.included && !result.above_threshold[i] {
            *counts.entry(result.dominant[i]).or_default() += 1;
        }
    }

    let mut rows: Vec<DominanceCount> = counts
        .into_iter()
        .map(|(dominance, count)| DominanceCount {
            scenario: scenario_name.to_string(),
            pressure: dominance.label(),
            count,
        })
        .collect();
    rows.sort_by_key(|r| r.pressure);
    rows
}

/// Count benchmark rivers whose entire course stays at or above the
/// CSI threshold.
///
/// A benchmark river matches only when its minimum reach-level CSI
/// meets the threshold; a single impacted reach disqualifies the whole
/// river. Benchmark entries pointing at reaches outside the network
/// are ignored.
pub fn benchmark_matches(
    network: &RiverNetwork,
    result: &CsiResult,
    benchmarks: &[BenchmarkEntry],
    csi_threshold: f64,
) -> usize {
    let mut min_csi: HashMap<u64, f64> = HashMap::new();
    for entry in benchmarks {
        if let Some(id) = network.network_id_of(entry.reach_id) {
            let csi = result.csi[id.index()];
            min_csi
                .entry(entry.river_id)
                .and_modify(|m| *m = m.min(csi))
                .or_insert(csi);
        }
    }

    min_csi.values().filter(|&&m| m >= csi_threshold).count()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluvia_core::{Reach, ReachId};

    fn network(n: u64) -> RiverNetwork {
        let reaches = (1..=n)
            .map(|i| Reach {
                reach_id: ReachId(i),
                next_down: if i < n { ReachId(i + 1) } else { ReachId::NONE },
                basin_id: 1,
                included: true,
                upland_skm: i as f64,
                ..Reach::default()
            })
            .collect();
        RiverNetwork::build(reaches).unwrap()
    }

    fn result(csi: Vec<f64>, dominant: Vec<Dominance>, threshold: f64) -> CsiResult {
        let above_threshold = csi.iter().map(|&v| v >= threshold).collect();
        CsiResult {
            csi,
            dominant,
            above_threshold,
        }
    }

    #[test]
    fn test_global_stats_counts() {
        let net = network(4);
        let result = result(
            vec![100.0, 99.5, 80.0, 100.0],
            vec![Dominance::None, Dominance::Dof, Dominance::Dor, Dominance::None],
            95.0,
        );
        let stats = global_stats(&net, &result, "CSI");

        assert_eq!(stats.reach_count, 4);
        assert_eq!(stats.impacted_count, 2);
        assert_eq!(stats.impacted_pct, 50.0);
        // Mean of 99.5 and 80.0, rounded to one decimal
        assert_eq!(stats.impacted_mean_csi, 89.8);
        assert_eq!(stats.below_threshold_count, 1);
        assert_eq!(stats.below_threshold_pct, 25.0);
    }

    #[test]
    fn test_excluded_reaches_ignored() {
        let mut reaches: Vec<Reach> = (1..=3)
            .map(|i| Reach {
                reach_id: ReachId(i),
                next_down: ReachId::NONE,
                basin_id: 1,
                included: true,
                upland_skm: i as f64,
                ..Reach::default()
            })
            .collect();
        reaches[2].included = false;
        let net = RiverNetwork::build(reaches).unwrap();

        let result = result(
            vec![50.0, 100.0, 50.0],
            vec![Dominance::Dof, Dominance::None, Dominance::Dof],
            95.0,
        );
        let stats = global_stats(&net, &result, "CSI");
        assert_eq!(stats.reach_count, 2);
        assert_eq!(stats.impacted_count, 1);

        let dom = dominance_counts(&net, &result, "CSI");
        assert_eq!(dom.len(), 1);
        assert_eq!(dom[0].pressure, "DOF");
        assert_eq!(dom[0].count, 1);
    }

    #[test]
    fn test_dominance_tally_below_threshold_only() {
        let net = network(4);
        let result = result(
            vec![50.0, 60.0, 96.0, 50.0],
            vec![
                Dominance::Dof,
                Dominance::Sed,
                Dominance::Dor,
                Dominance::Dof,
            ],
            95.0,
        );
        let rows = dominance_counts(&net, &result, "CSI");

        // DOR row absent: its reach is above the threshold
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pressure, "DOF");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].pressure, "SED");
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn test_benchmark_river_fails_on_single_reach() {
        let net = network(4);
        let result = result(
            vec![100.0, 94.0, 100.0, 100.0],
            vec![Dominance::None; 4],
            95.0,
        );

        // River 1 covers reaches 1-2, river 2 covers reaches 3-4
        let benchmarks = vec![
            BenchmarkEntry { reach_id: ReachId(1), river_id: 1 },
            BenchmarkEntry { reach_id: ReachId(2), river_id: 1 },
            BenchmarkEntry { reach_id: ReachId(3), river_id: 2 },
            BenchmarkEntry { reach_id: ReachId(4), river_id: 2 },
        ];

        assert_eq!(benchmark_matches(&net, &result, &benchmarks, 95.0), 1);
    }

    #[test]
    fn test_benchmark_entries_outside_network_ignored() {
        let net = network(2);
        let result = result(vec![100.0, 100.0], vec![Dominance::None; 2], 95.0);
        let benchmarks = vec![BenchmarkEntry {
            reach_id: ReachId(99),
            river_id: 5,
        }];
        assert_eq!(benchmark_matches(&net, &result, &benchmarks, 95.0), 0);
    }
}
