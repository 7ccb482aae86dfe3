//! Routing index builder
//!
//! Assigns dense 1-based network ids to a reach collection and derives
//! the downstream/upstream adjacency from the raw "next reach
//! downstream" pointers. The id order follows a topological sort key
//! (by default basin id, then upland area ascending), so iterating
//! reaches in id order visits every reach before its downstream
//! neighbor. The sediment engine relies on that invariant.
//!
//! The index must be rebuilt whenever a subset of the global network
//! is extracted; a subset is not contiguously numbered, and reusing
//! ids from the full network would corrupt the adjacency.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::network::reach::{
    Barrier, Lake, LocatedBarrier, LocatedLake, NetworkId, Reach, ReachId,
};

/// A river-reach network with a dense, topologically sorted index.
///
/// Reach `i` (0-based) holds network id `i + 1`. The adjacency is kept
/// as plain arrays indexed the same way: `downstream[i]` is the raw
/// 1-based id of the next reach downstream (0 = sink), and
/// `upstream[i]` lists the 1-based ids of all reaches flowing into
/// reach `i + 1`, in insertion order.
#[derive(Debug, Clone)]
pub struct RiverNetwork {
    reaches: Vec<Reach>,
    downstream: Vec<u32>,
    upstream: Vec<Vec<u32>>,
    index: HashMap<ReachId, NetworkId>,
}

impl RiverNetwork {
    /// Build the routing index with the canonical sort key:
    /// basin id ascending, then upland area ascending.
    pub fn build(reaches: Vec<Reach>) -> Result<Self> {
        Self::build_with_key(reaches, |r| (r.basin_id, OrdF64(r.upland_skm)))
    }

    /// Build the routing index with a caller-supplied sort key.
    ///
    /// The key must order every reach before its downstream neighbor
    /// for the topological passes (SED) to be valid; upland area
    /// within a basin has that property on drainage networks.
    pub fn build_with_key<K, F>(mut reaches: Vec<Reach>, key: F) -> Result<Self>
    where
        K: Ord,
        F: Fn(&Reach) -> K,
    {
        reaches.sort_by(|a, b| key(a).cmp(&key(b)));

        let n = reaches.len();
        let mut index = HashMap::with_capacity(n);
        for (i, reach) in reaches.iter().enumerate() {
            let previous = index.insert(reach.reach_id, NetworkId::from_index(i));
            if previous.is_some() {
                return Err(Error::DataIntegrity(format!(
                    "duplicate reach id {} in network input",
                    reach.reach_id
                )));
            }
        }

        // Resolve downstream pointers through the old->new map and
        // invert them into the upstream fan-in lists. A pointer that
        // does not resolve within this subset becomes 0: the reach is
        // a terminal sink for routing purposes.
        let mut downstream = vec![0u32; n];
        let mut upstream = vec![Vec::new(); n];
        for i in 0..n {
            let target = reaches[i].next_down;
            if target.is_none() {
                continue;
            }
            if let Some(&down) = index.get(&target) {
                downstream[i] = down.get();
                upstream[down.index()].push(NetworkId::from_index(i).get());
            }
        }

        Ok(RiverNetwork {
            reaches,
            downstream,
            upstream,
            index,
        })
    }

    /// Number of reaches in the network.
    pub fn len(&self) -> usize {
        self.reaches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reaches.is_empty()
    }

    /// All reaches in network-id order.
    pub fn reaches(&self) -> &[Reach] {
        &self.reaches
    }

    /// The reach holding the given network id.
    pub fn reach(&self, id: NetworkId) -> &Reach {
        &self.reaches[id.index()]
    }

    /// Network id of a reach by its original id, if it is in this subset.
    pub fn network_id_of(&self, reach_id: ReachId) -> Option<NetworkId> {
        self.index.get(&reach_id).copied()
    }

    /// The single downstream neighbor, or `None` at a sink.
    pub fn downstream_of(&self, id: NetworkId) -> Option<NetworkId> {
        match self.downstream[id.index()] {
            0 => None,
            d => Some(NetworkId::new(d)),
        }
    }

    /// Network ids of all reaches flowing into the given reach.
    pub fn upstream_of(&self, id: NetworkId) -> impl Iterator<Item = NetworkId> + '_ {
        self.upstream[id.index()].iter().map(|&u| NetworkId::new(u))
    }

    /// All sinks (reaches with no downstream neighbor), in id order.
    pub fn sinks(&self) -> impl Iterator<Item = NetworkId> + '_ {
        self.downstream
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| NetworkId::from_index(i))
    }

    /// Resolve barriers onto this network's dense ids.
    ///
    /// Barriers whose reach is not part of this subset are dropped, as
    /// are barriers flagged excluded. This remapping is required
    /// before any engine runs.
    pub fn locate_barriers(&self, barriers: &[Barrier]) -> Vec<LocatedBarrier> {
        barriers
            .iter()
            .filter(|b| b.included)
            .filter_map(|b| {
                self.network_id_of(b.reach_id).map(|on| LocatedBarrier {
                    on,
                    storage_mcm: b.storage_mcm,
                    drf_upstream: b.drf_upstream,
                    drf_downstream: b.drf_downstream,
                })
            })
            .collect()
    }

    /// Resolve lakes onto this network's dense ids, dropping lakes
    /// whose reach is outside the subset.
    pub fn locate_lakes(&self, lakes: &[Lake]) -> Vec<LocatedLake> {
        lakes
            .iter()
            .filter_map(|l| {
                self.network_id_of(l.reach_id).map(|on| LocatedLake {
                    on,
                    lake_type: l.lake_type,
                    excluded_dam: l.excluded_dam,
                    in_catchment: l.in_catchment,
                    in_stream: l.in_stream,
                    volume_mcm: l.volume_mcm,
                    discharge_cms: l.discharge_cms,
                    sed_acc_tons: l.sed_acc_tons,
                })
            })
            .collect()
    }
}

/// Total order on f64 for sort keys. Upland areas are finite
/// measurements; NaN sorts last rather than poisoning the sort.
#[derive(PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reach(id: u64, down: u64, basin: u32, upland: f64) -> Reach {
        Reach {
            reach_id: ReachId(id),
            next_down: ReachId(down),
            basin_id: basin,
            upland_skm: upland,
            ..Reach::default()
        }
    }

    #[test]
    fn test_ids_are_permutation_and_sorted() {
        // Original ids deliberately non-contiguous and out of order
        let reaches = vec![
            reach(42, 7, 1, 30.0),
            reach(7, 0, 1, 50.0),
            reach(103, 42, 1, 10.0),
        ];
        let net = RiverNetwork::build(reaches).unwrap();

        assert_eq!(net.len(), 3);
        // Sorted by upland area: 103 (10), 42 (30), 7 (50)
        assert_eq!(net.reaches()[0].reach_id, ReachId(103));
        assert_eq!(net.reaches()[1].reach_id, ReachId(42));
        assert_eq!(net.reaches()[2].reach_id, ReachId(7));

        let ids: Vec<u32> = (0..net.len())
            .map(|i| NetworkId::from_index(i).get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_adjacency_inversion() {
        let reaches = vec![
            reach(1, 3, 1, 10.0),
            reach(2, 3, 1, 20.0),
            reach(3, 0, 1, 40.0),
        ];
        let net = RiverNetwork::build(reaches).unwrap();

        // Every reach with a downstream neighbor appears in that
        // neighbor's upstream list
        for i in 0..net.len() {
            let id = NetworkId::from_index(i);
            if let Some(down) = net.downstream_of(id) {
                assert!(
                    net.upstream_of(down).any(|u| u == id),
                    "reach {} missing from upstream of {}",
                    id,
                    down
                );
            }
        }

        let sink = net.network_id_of(ReachId(3)).unwrap();
        assert_eq!(net.upstream_of(sink).count(), 2);
        assert_eq!(net.sinks().count(), 1);
    }

    #[test]
    fn test_unresolved_downstream_becomes_sink() {
        // Reach 5 points at reach 99, which is not in the subset
        let reaches = vec![reach(5, 99, 1, 10.0)];
        let net = RiverNetwork::build(reaches).unwrap();

        let id = net.network_id_of(ReachId(5)).unwrap();
        assert!(net.downstream_of(id).is_none());
        assert_eq!(net.sinks().count(), 1);
    }

    #[test]
    fn test_duplicate_reach_id_rejected() {
        let reaches = vec![reach(5, 0, 1, 10.0), reach(5, 0, 1, 20.0)];
        assert!(matches!(
            RiverNetwork::build(reaches),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_locate_barriers_drops_unmapped() {
        let reaches = vec![reach(1, 2, 1, 10.0), reach(2, 0, 1, 20.0)];
        let net = RiverNetwork::build(reaches).unwrap();

        let barriers = vec![
            Barrier {
                reach_id: ReachId(1),
                basin_id: 1,
                storage_mcm: 10.0,
                drf_upstream: None,
                drf_downstream: None,
                included: true,
            },
            Barrier {
                reach_id: ReachId(77),
                basin_id: 1,
                storage_mcm: 10.0,
                drf_upstream: None,
                drf_downstream: None,
                included: true,
            },
        ];

        let located = net.locate_barriers(&barriers);
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].on, net.network_id_of(ReachId(1)).unwrap());
    }
}
