//! Part Catalog
//!
//! The catalog is the only long-lived state of the system: it is loaded once,
//! validated, and then shared read-only by every optimization request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  JSON file / │───▶│   Part       │───▶│   Catalog    │
//! │  directory   │    │  Validation  │    │    Store     │
//! └──────────────┘    └──────────────┘    └──────┬───────┘
//!        ▲                                       │
//!        │                          ┌────────────┴────────────┐
//! ┌──────────────┐                  ▼                         ▼
//! │   Embedded   │           ┌────────────┐           ┌──────────────┐
//! │   catalog    │           │  packages  │           │    parts     │
//! └──────────────┘           └────────────┘           └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use capbank::catalog::CatalogStore;
//!
//! let catalog = CatalogStore::builtin().unwrap();
//! for package in catalog.packages() {
//!     println!("{}", package);
//! }
//! ```

pub mod builtin;
pub mod package;
pub mod schema;
pub mod store;

pub use builtin::{load_catalog, load_catalog_from_directory, load_catalog_from_file};
pub use package::normalize_package;
pub use schema::CapacitorPart;
pub use store::CatalogStore;
