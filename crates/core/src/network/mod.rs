//! River network data model and routing index
//!
//! - `Reach`, `Barrier`, `Lake`: input records
//! - `NetworkId`: dense 1-based routing id with typed index conversion
//! - `RiverNetwork`: reaches plus downstream/upstream adjacency

mod reach;
mod routing;

pub use reach::{Barrier, Lake, LocatedBarrier, LocatedLake, NetworkId, Reach, ReachId};
pub use routing::RiverNetwork;
