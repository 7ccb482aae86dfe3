//! # Fluvia Indices
//!
//! Connectivity and sediment-transport index engines for river
//! networks.
//!
//! ## Available Engines
//!
//! - **dof**: Degree of Fragmentation (barrier backwater effects)
//! - **dor**: Degree of Regulation (reservoir storage vs. discharge)
//! - **sed**: Sediment Trapping Index (natural vs. anthropogenic loss)
//! - **csi**: Connectivity Status Index (weighted pressure overlay)
//! - **status**: Free-flowing status (dissolve, filter, classify)
//! - **basin**: Per-basin parallel runner for DOF and DOR
//! - **stats**: Network-wide summary and benchmark statistics

pub mod basin;
pub mod csi;
pub mod dof;
pub mod dor;
pub mod sed;
pub mod stats;
pub mod status;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::basin::{compute_by_basin, FragmentationResults};
    pub use crate::csi::{compute_csi, CsiResult, Dominance, PressureInputs};
    pub use crate::dof::{compute_dof, DecayMode, DofParams, DofResult};
    pub use crate::dor::{compute_dor, DorResult};
    pub use crate::sed::{
        compute_sed, pool_barrier_volumes, prepare_lakes, trapping_efficiency, LakeBudget,
        SedResult,
    };
    pub use crate::stats::{
        benchmark_matches, dominance_counts, global_stats, DominanceCount, GlobalStats,
    };
    pub use crate::status::{compute_status, FlowStatus, StatusResult};
    pub use fluvia_core::prelude::*;
}
