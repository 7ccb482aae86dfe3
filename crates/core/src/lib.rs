//! # Fluvia Core
//!
//! Core types and I/O for the Fluvia river-connectivity library.
//!
//! This crate provides:
//! - `Reach`, `Barrier`, `Lake`: input records of the river network
//! - `RiverNetwork`: routing index with dense ids and adjacency
//! - `Scenario`, `RunSettings`: weighting configuration
//! - CSV I/O for the input and output tables

pub mod error;
pub mod io;
pub mod network;
pub mod scenario;

pub use error::{Error, Result};
pub use network::{
    Barrier, Lake, LocatedBarrier, LocatedLake, NetworkId, Reach, ReachId, RiverNetwork,
};
pub use scenario::{RunSettings, Scenario};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::network::{
        Barrier, Lake, LocatedBarrier, LocatedLake, NetworkId, Reach, ReachId, RiverNetwork,
    };
    pub use crate::scenario::{RunSettings, Scenario};
}
