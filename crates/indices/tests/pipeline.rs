//! End-to-end pipeline tests on a small synthetic network.
//!
//! The network is a single basin with a main stem and one tributary:
//!
//!   r1 (head) -> r2 -> r4 -> r5 (sink)
//!   r3 (trib) ------^
//!
//! A dam with reservoir storage sits on r2. The tests run the full
//! chain: per-basin fragmentation, sediment routing, CSI overlay,
//! dissolve and status, summary statistics.

use std::collections::HashMap;

use fluvia_core::{
    Barrier, Reach, ReachId, RiverNetwork, RunSettings, Scenario,
};
use fluvia_indices::prelude::*;

fn test_reaches() -> Vec<Reach> {
    let mk = |id: u64, down: u64, q: f64, upland: f64| Reach {
        reach_id: ReachId(id),
        next_down: ReachId(down),
        basin_id: 1,
        backbone_id: 7,
        length_km: 10.0,
        volume_tcm: 20.0,
        discharge_cms: q,
        upland_skm: upland,
        erosion_yield_tons: 100.0,
        included: true,
        bb_length_km: 50.0,
        bb_volume_tcm: 100.0,
        ..Reach::default()
    };
    vec![
        mk(1, 2, 8.0, 10.0),
        mk(2, 4, 10.0, 20.0),
        mk(3, 4, 5.0, 15.0),
        mk(4, 5, 16.0, 40.0),
        mk(5, 0, 18.0, 50.0),
    ]
}

fn test_barriers() -> Vec<Barrier> {
    vec![Barrier {
        reach_id: ReachId(2),
        basin_id: 1,
        storage_mcm: 200.0,
        drf_upstream: None,
        drf_downstream: None,
        included: true,
    }]
}

// ---------------------------------------------------------------------------
// Fragmentation (DOF + DOR)
// ---------------------------------------------------------------------------

#[test]
fn fragmentation_centers_on_the_dam() {
    let reaches = test_reaches();
    let result =
        compute_by_basin(&reaches, &test_barriers(), &RunSettings::default()).unwrap();

    // Input order is r1..r5
    assert_eq!(result.dof[1], 100.0, "dam reach fully fragmented");
    assert!(result.dof[0] > 0.0, "upstream of dam affected");
    assert!(result.dof[3] > 0.0, "downstream of dam affected");
    assert!(
        result.dof[0] < 100.0 && result.dof[3] < 100.0,
        "effect decays away from the dam"
    );

    // DOR only downstream of the dam
    assert!(result.dor[1] > 0.0);
    assert!(result.dor[3] > 0.0);
    assert_eq!(result.dor[0], 0.0);
    assert_eq!(result.dor[2], 0.0, "tributary unaffected");
}

// ---------------------------------------------------------------------------
// Sediment routing
// ---------------------------------------------------------------------------

#[test]
fn sediment_index_appears_at_and_below_the_dam() {
    let network = RiverNetwork::build(test_reaches()).unwrap();
    let located = network.locate_barriers(&test_barriers());

    let dams = pool_barrier_volumes(&located);
    let result = compute_sed(&network, &dams, &LakeBudget::default());

    let idx = |id: u64| network.network_id_of(ReachId(id)).unwrap().index();

    // Natural load at the sink is the sum of all five yields
    assert!((result.sed_nat[idx(5)] - 500.0).abs() < 1e-9);

    assert_eq!(result.sed[idx(1)], 0.0);
    assert_eq!(result.sed[idx(3)], 0.0);
    assert!(result.sed[idx(2)] > 0.0);
    assert!(result.sed[idx(5)] > 0.0);

    // The tributary dilutes the relative loss below the confluence
    assert!(result.sed[idx(4)] < result.sed[idx(2)]);
}

// ---------------------------------------------------------------------------
// CSI + status + statistics
// ---------------------------------------------------------------------------

fn pressures_from(
    network: &RiverNetwork,
    frag: &FragmentationResults,
    reaches: &[Reach],
    sed: &SedResult,
) -> Vec<PressureInputs> {
    // frag is aligned with the input slice; rekey it to network order
    let by_id: HashMap<ReachId, usize> = reaches
        .iter()
        .enumerate()
        .map(|(i, r)| (r.reach_id, i))
        .collect();

    network
        .reaches()
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let input_pos = by_id[&r.reach_id];
            PressureInputs {
                dof: frag.dof[input_pos],
                dor: frag.dor[input_pos],
                sed: sed.sed[i],
                land_use: r.land_use,
                road: r.road_density,
                urban: r.urban_extent,
                floodplain_pct: r.floodplain_pct,
            }
        })
        .collect()
}

#[test]
fn full_pipeline_classifies_the_river() {
    let reaches = test_reaches();
    let barriers = test_barriers();
    let settings = RunSettings::default();
    let scenario = Scenario::default();

    let frag = compute_by_basin(&reaches, &barriers, &settings).unwrap();

    let network = RiverNetwork::build(reaches.clone()).unwrap();
    let located = network.locate_barriers(&barriers);
    let sed = compute_sed(
        &network,
        &pool_barrier_volumes(&located),
        &LakeBudget::default(),
    );

    let inputs = pressures_from(&network, &frag, &reaches, &sed);
    let csi = compute_csi(&inputs, &scenario);

    let idx = |id: u64| network.network_id_of(ReachId(id)).unwrap().index();

    // The dam reach must fall below the default threshold and be
    // dominated by fragmentation
    assert!(csi.csi[idx(2)] < scenario.csi_threshold);
    assert_eq!(csi.dominant[idx(2)], Dominance::Dof);

    let status = compute_status(&network, &csi.above_threshold, &scenario);

    // The impacted stretch around the dam is 40% of backbone volume,
    // far above the 1% filter, so the river cannot be free-flowing
    assert_eq!(status.status[idx(2)], FlowStatus::Impacted);
    assert!(status
        .status
        .iter()
        .all(|&s| s != FlowStatus::FreeFlowing));

    // Reaches sharing (backbone, flag) share a stretch id
    for i in 0..network.len() {
        for j in 0..network.len() {
            if status.stretch_id[i] == status.stretch_id[j] {
                assert_eq!(csi.above_threshold[i], csi.above_threshold[j]);
            }
        }
    }

    let stats = global_stats(&network, &csi, &scenario.name);
    assert_eq!(stats.reach_count, 5);
    assert!(stats.impacted_count >= 1);
    assert!(stats.below_threshold_count >= 1);
    assert!(stats.impacted_mean_csi < 100.0);

    let dom = dominance_counts(&network, &csi, &scenario.name);
    let total: usize = dom.iter().map(|d| d.count).sum();
    assert_eq!(total, stats.below_threshold_count);
}

#[test]
fn pristine_network_stays_free_flowing() {
    let reaches = test_reaches();
    let scenario = Scenario::default();

    let frag = compute_by_basin(&reaches, &[], &RunSettings::default()).unwrap();
    assert!(frag.dof.iter().all(|&v| v == 0.0));
    assert!(frag.dor.iter().all(|&v| v == 0.0));

    let network = RiverNetwork::build(reaches.clone()).unwrap();
    let sed = compute_sed(&network, &HashMap::new(), &LakeBudget::default());
    assert!(sed.sed.iter().all(|&v| v == 0.0));

    let inputs = pressures_from(&network, &frag, &reaches, &sed);
    let csi = compute_csi(&inputs, &scenario);
    assert!(csi.csi.iter().all(|&v| v == 100.0));

    let status = compute_status(&network, &csi.above_threshold, &scenario);
    assert!(status.status.iter().all(|&s| s == FlowStatus::FreeFlowing));
    assert!(status.stretch_id.iter().all(|&s| s == status.stretch_id[0]));

    let stats = global_stats(&network, &csi, &scenario.name);
    assert_eq!(stats.impacted_count, 0);
    assert_eq!(stats.below_threshold_pct, 0.0);
}
