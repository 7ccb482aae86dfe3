//! River reach, barrier and lake records
//!
//! A `Reach` is one directed segment of the river network. Reaches
//! carry the hydrological attributes the index engines consume
//! (discharge, erosion yield, pressure layers) plus the backbone-river
//! membership used by the dissolve stage.

use serde::{Deserialize, Serialize};

/// Original, stable reach identifier (unique across the global network).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReachId(pub u64);

impl ReachId {
    /// Sentinel meaning "no reach" (an outlet's downstream pointer).
    pub const NONE: ReachId = ReachId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ReachId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Dense 1-based network id assigned by the routing index builder.
///
/// Network ids are a permutation of `1..=N` consistent with the
/// topological sort order of the network. The id value is 1-based;
/// [`NetworkId::index`] converts to the 0-based array offset so the
/// off-by-one arithmetic lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkId(u32);

impl NetworkId {
    /// Construct from a 1-based id. Panics on 0, which is not a valid id.
    pub fn new(id: u32) -> Self {
        assert!(id > 0, "network ids are 1-based");
        NetworkId(id)
    }

    /// Construct from a 0-based array offset.
    pub fn from_index(index: usize) -> Self {
        NetworkId(index as u32 + 1)
    }

    /// The raw 1-based id.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The 0-based array offset for this id.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One river reach with the attributes required by the index engines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reach {
    /// Original stable identifier.
    pub reach_id: ReachId,
    /// Original id of the next reach downstream (`ReachId::NONE` = outlet).
    pub next_down: ReachId,
    /// Hydrological basin this reach belongs to.
    pub basin_id: u32,
    /// Backbone river this reach belongs to (0 = none).
    pub backbone_id: u64,
    /// Reach length in kilometers.
    pub length_km: f64,
    /// Reach channel volume in thousand cubic meters.
    pub volume_tcm: f64,
    /// Long-term average discharge in cubic meters per second.
    pub discharge_cms: f64,
    /// Discharge river order (log10 class of discharge).
    pub river_order: i32,
    /// Waterfall present on this reach; blocks upstream DOF propagation.
    pub has_waterfall: bool,
    /// Upland (contributing) area in square kilometers.
    pub upland_skm: f64,
    /// Sediment yield of the reach catchment in tons per year.
    pub erosion_yield_tons: f64,
    /// Percent of the reach catchment covered by floodplains.
    pub floodplain_pct: f64,
    /// Land-use pressure value (0-100).
    pub land_use: f64,
    /// Road-density pressure value (0-100).
    pub road_density: f64,
    /// Urbanization pressure value (0-1, unit-corrected by the CSI engine).
    pub urban_extent: f64,
    /// Reach included in the assessment.
    pub included: bool,
    /// Total length of the backbone river in kilometers.
    pub bb_length_km: f64,
    /// Total volume of the backbone river in thousand cubic meters.
    pub bb_volume_tcm: f64,
}

/// A dam or comparable point obstruction located on exactly one reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    /// Reach the barrier sits on, in original ids.
    pub reach_id: ReachId,
    /// Basin of the barrier; must be nonzero for the per-basin runner.
    pub basin_id: u32,
    /// Reservoir storage volume in million cubic meters.
    pub storage_mcm: f64,
    /// Per-barrier upstream discharge range factor, if provided.
    pub drf_upstream: Option<f64>,
    /// Per-barrier downstream discharge range factor, if provided.
    pub drf_downstream: Option<f64>,
    /// Barrier included in the assessment.
    pub included: bool,
}

/// A natural water body, optionally coincident with a reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lake {
    /// Reach the lake drains to, in original ids.
    pub reach_id: ReachId,
    /// Lake type (1 = natural; other values are regulated/excluded).
    pub lake_type: i32,
    /// Lake is actually a dam reservoir counted elsewhere; excluded here.
    pub excluded_dam: bool,
    /// Lake lies within a stream catchment (coastal lakes do not).
    pub in_catchment: bool,
    /// Lake is part of the stream network itself.
    pub in_stream: bool,
    /// Total lake volume in million cubic meters.
    pub volume_mcm: f64,
    /// Average discharge at the lake outflow in cubic meters per second.
    pub discharge_cms: f64,
    /// Sediment accumulation in the lake in tons per year.
    pub sed_acc_tons: f64,
}

/// A barrier resolved onto the dense network ids of one [`RiverNetwork`].
///
/// Produced by [`RiverNetwork::locate_barriers`]; the engines only ever
/// see located records, so stale original ids cannot leak into routing.
///
/// [`RiverNetwork`]: super::RiverNetwork
/// [`RiverNetwork::locate_barriers`]: super::RiverNetwork::locate_barriers
#[derive(Debug, Clone)]
pub struct LocatedBarrier {
    /// Network id of the reach the barrier sits on.
    pub on: NetworkId,
    /// Reservoir storage volume in million cubic meters.
    pub storage_mcm: f64,
    /// Per-barrier upstream discharge range factor, if provided.
    pub drf_upstream: Option<f64>,
    /// Per-barrier downstream discharge range factor, if provided.
    pub drf_downstream: Option<f64>,
}

/// A lake resolved onto the dense network ids of one `RiverNetwork`.
#[derive(Debug, Clone)]
pub struct LocatedLake {
    /// Network id of the reach the lake drains to.
    pub on: NetworkId,
    /// Lake type (1 = natural).
    pub lake_type: i32,
    /// Lake is a reservoir counted as a barrier; excluded from SED.
    pub excluded_dam: bool,
    /// Lake lies within a stream catchment.
    pub in_catchment: bool,
    /// Lake is part of the stream network itself.
    pub in_stream: bool,
    /// Total lake volume in million cubic meters.
    pub volume_mcm: f64,
    /// Average discharge at the lake outflow in cubic meters per second.
    pub discharge_cms: f64,
    /// Sediment accumulation in the lake in tons per year.
    pub sed_acc_tons: f64,
}
