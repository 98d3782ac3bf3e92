//! CapBank - capacitor network synthesis from real catalog parts
//!
//! Given a target capacitance, a tolerance band and voltage, temperature and
//! package requirements, this library builds series/parallel networks out of
//! purchasable capacitors and ranks them by physical volume.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use capbank::{CatalogStore, OptimizationService, OptimizeRequest, ServiceOptions};
//!
//! let catalog = Arc::new(CatalogStore::builtin().unwrap());
//! let service = OptimizationService::new(catalog, ServiceOptions::default()).unwrap();
//!
//! let request = OptimizeRequest {
//!     target_cap: 10e-6,
//!     tolerance: 0.1,
//!     dc_bias: 0.3,
//!     max_count: 4,
//!     min_rated_volt: 25.0,
//!     min_temp: 85.0,
//!     conn_type: 0,
//!     packages: vec!["0603".into(), "0805".into()],
//!     max_esr: None,
//! };
//!
//! for candidate in service.optimize(&request).unwrap().candidates {
//!     println!("{} {:.3} mm³ {}", candidate.shape_tag, candidate.volume_mm3, candidate.label);
//! }
//! ```
//!
//! # Features
//!
//! - **Backward search**: per-shape capacitance windows instead of brute force
//! - **Two-part mixes**: tried only where no single-part fill works
//! - **Deterministic ranking**: volume, part count, distance to target
//! - **Deadlines**: best-effort partial results or an explicit timeout

pub mod catalog;
pub mod constraint;
pub mod core;
pub mod network;
pub mod progress;
pub mod ranking;

// Re-export main types
pub use crate::core::{
    CapBankError, OptimizationService, ResultSet, SearchStats, ServiceOptions, TimeoutPolicy,
};
pub use catalog::{CapacitorPart, CatalogStore};
pub use constraint::{ConnectionType, Constraint, ConstraintError, ConstraintValidator, OptimizeRequest};
pub use network::{Candidate, EquivalentCalculator, NetworkEnumerator, PoolLimits, Topology};
pub use progress::{Progress, ProgressSink};
pub use ranking::{RankingEngine, DEFAULT_TOP_K};

/// Optimize against the built-in catalog with default options (convenience wrapper).
pub fn optimize(request: &OptimizeRequest) -> Result<ResultSet, CapBankError> {
    let catalog = std::sync::Arc::new(CatalogStore::builtin()?);
    OptimizationService::new(catalog, ServiceOptions::default())?.optimize(request)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CapBankError, Candidate, CatalogStore, ConnectionType, OptimizationService,
        OptimizeRequest, ResultSet, ServiceOptions, TimeoutPolicy,
    };
}
