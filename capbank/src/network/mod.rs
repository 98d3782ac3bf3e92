//! Network Synthesis
//!
//! Turns a validated constraint into concrete series/parallel networks and
//! evaluates each one.
//!
//! - [`NetworkEnumerator`] walks shapes lazily and fills them with parts
//! - [`EquivalentCalculator`] computes capacitance, ratings, volume and ESR
//! - [`Topology`] and [`Candidate`] carry a network before and after evaluation

pub mod calculator;
pub mod candidate;
pub mod enumerator;
pub mod pool;
pub mod topology;

pub use calculator::EquivalentCalculator;
pub use candidate::{Candidate, PartUsage};
pub use enumerator::{count_shapes, NetworkEnumerator};
pub use pool::{search_pool, PoolLimits};
pub use topology::{Arrangement, Block, Group, Member, Shape, StructureKey, Topology};
