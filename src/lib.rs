//! # ringhash - toroidal spatial hash with ring-expanding queries
//!
//! Answers "which entities lie within radius `d` of point `P`" over a large,
//! continuously moving 2D population, fast enough to run every tick.
//!
//! The host owns the entity array; ringhash keeps a derived grid of buckets
//! and answers proximity queries against it.
//!
//! ## Quick Start
//!
//! ```
//! use ringhash::prelude::*;
//!
//! let config = SpatialConfig::new(6, 1.0); // 64x64 cells of size 1.0
//! let geometry = RawGeometry::generate(3).unwrap();
//! let mut hash = SpatialHash::new(config, &geometry).unwrap();
//!
//! let entries: Vec<Entry> = (0..100)
//!     .map(|i| Entry::new(i, Vec2::new(i as f32 * 0.3, 2.0)))
//!     .collect();
//! hash.initialize(&entries);
//!
//! let hits = hash.search(Vec2::new(3.0, 2.0), 1.0, 5);
//! assert_eq!(hits.len(), 5);
//! assert!(hits.iter().all(|h| h.distance < 1.0));
//! ```
//!
//! ## Core Concepts
//!
//! ### Grid
//!
//! A square torus of `2^n x 2^n` cells. A position is scaled by the inverse
//! cell size, floored, and masked into range, so every position in the plane
//! maps to a valid cell and far-apart positions can alias.
//!
//! ### Offset geometry and the catalog
//!
//! [`RawGeometry`] lists steps of `(dx, dy)` cell offsets in increasing
//! distance bands. It is loaded from a blob (see the [`geometry`] module) or
//! generated with [`RawGeometry::generate`]. The [`OffsetCatalog`] localizes
//! the steps for every cell of the torus and stores each distinct result once.
//!
//! ### Placements
//!
//! Every tracked entity records its cell and slot. Removal is a swap-remove
//! that fixes up the one displaced entity, so insert, remove and relocate are
//! all O(1).
//!
//! ### Queries
//!
//! Searches walk ring steps outward and stop after the first completed step
//! that yields `max_count` hits. Distance filtering is exact; nearest-first
//! ranking is approximate (see the [`query`] module).
//!
//! ## Threading
//!
//! Everything is synchronous. Mutation takes `&mut self`, so concurrent
//! updates and queries need external synchronization around the whole tick.

pub mod catalog;
pub mod config;
mod entry;
pub mod error;
pub mod geometry;
pub mod grid;
mod handle;
pub mod placement;
pub mod query;
mod spatial_hash;

pub use bytemuck;
pub use catalog::{OffsetCatalog, RingListId, ShapeId};
pub use config::{DistanceMetric, SpatialConfig, MAX_SIDE_EXPONENT};
pub use entry::{Entry, Neighbor, Position};
pub use error::{ConfigError, GeometryError, PlacementMismatch, SpatialError};
pub use geometry::{RawGeometry, MAX_GENERATED_DISTANCE};
pub use glam::{IVec2, Vec2};
pub use grid::{Cell, CellEntry, Grid};
pub use handle::{Handle, HandleTable};
pub use placement::{Placement, PlacementRegistry, UpdateOutcome};
pub use query::BulkResults;
pub use spatial_hash::SpatialHash;

/// Prelude module for convenient imports.
///
/// ```
/// use ringhash::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BulkResults, DistanceMetric, Entry, Handle, HandleTable, Neighbor, Position, RawGeometry,
        SpatialConfig, SpatialError, SpatialHash,
    };
    pub use glam::{IVec2, Vec2};
}
