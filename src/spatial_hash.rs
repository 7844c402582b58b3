//! The spatial hash engine.

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::catalog::OffsetCatalog;
use crate::config::SpatialConfig;
use crate::entry::{Entry, Neighbor, Position};
use crate::error::{GeometryError, PlacementMismatch, SpatialError};
use crate::geometry::RawGeometry;
use crate::grid::Grid;
use crate::placement::{Placement, PlacementRegistry, UpdateOutcome};
use crate::query::{BulkResults, Searcher};

/// A toroidal uniform-grid index over a host-owned array of entries.
///
/// The host keeps the authoritative `&[Entry]`; entities are addressed by
/// their index in that array. Each tick the host calls
/// [`update_all`](Self::update_all) with the current entries, then issues
/// [`search`](Self::search) or [`search_bulk`](Self::search_bulk) queries.
///
/// # Example
///
/// ```
/// use ringhash::prelude::*;
///
/// let config = SpatialConfig::new(3, 1.0);
/// let mut hash = SpatialHash::new(config, &RawGeometry::generate(2).unwrap()).unwrap();
///
/// let mut entries = vec![
///     Entry::new(1, Vec2::new(0.5, 0.5)),
///     Entry::new(2, Vec2::new(0.5, 1.5)),
/// ];
/// hash.initialize(&entries);
///
/// entries[1].position = Vec2::new(3.5, 3.5);
/// hash.update_all(&entries).unwrap();
///
/// let hits = hash.search(Vec2::new(0.4, 0.6), 1.2, 5);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].id(), 1);
/// ```
pub struct SpatialHash {
    config: SpatialConfig,
    catalog: OffsetCatalog,
    grid: Grid,
    registry: PlacementRegistry,
    results: Vec<Neighbor>,
    counts: Vec<u32>,
}

impl SpatialHash {
    /// Build the grid and localize `geometry` for it.
    ///
    /// Fails on an invalid config or on geometry without any offsets.
    pub fn new(config: SpatialConfig, geometry: &RawGeometry) -> Result<Self, SpatialError> {
        config.validate()?;
        if geometry.offset_count() == 0 {
            return Err(GeometryError::Empty.into());
        }

        let catalog = OffsetCatalog::build(config.side_exponent, geometry);
        let grid = Grid::new(&config, &catalog);

        debug!(
            side_length = config.side_length(),
            cell_size = config.cell_size,
            metric = ?config.metric,
            "spatial hash created"
        );

        Ok(Self {
            config,
            catalog,
            grid,
            registry: PlacementRegistry::default(),
            results: Vec::with_capacity(config.result_capacity),
            counts: Vec::new(),
        })
    }

    /// Like [`new`](Self::new), reading the geometry blob from `path`.
    pub fn from_geometry_file(
        config: SpatialConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, SpatialError> {
        let geometry = RawGeometry::load(path)?;
        Self::new(config, &geometry)
    }

    /// Replace the grid contents with `entries`. Capacity becomes
    /// `entries.len()` and every index is tracked.
    pub fn initialize(&mut self, entries: &[Entry]) {
        self.grid.clear();
        self.registry.track_all(&mut self.grid, entries);
        debug!(
            entries = entries.len(),
            occupied_cells = self.grid.occupied_cells(),
            "spatial hash initialized"
        );
    }

    /// Re-hash every tracked entity from `entries`. Returns how many moved
    /// to another cell.
    ///
    /// `entries` must have the length given to [`initialize`](Self::initialize).
    pub fn update_all(&mut self, entries: &[Entry]) -> Result<usize, SpatialError> {
        let expected = self.registry.capacity();
        if entries.len() != expected {
            return Err(SpatialError::LengthMismatch {
                expected,
                actual: entries.len(),
            });
        }

        let mut relocated = 0;
        for (index, entry) in entries.iter().enumerate() {
            if self.registry.get(index).is_none() {
                continue;
            }
            let outcome = self.registry.update(&mut self.grid, index, *entry)?;
            if matches!(outcome, UpdateOutcome::Relocated { .. }) {
                relocated += 1;
            }
        }
        Ok(relocated)
    }

    /// Re-hash one tracked entity.
    pub fn update(&mut self, index: usize, entry: Entry) -> Result<UpdateOutcome, SpatialError> {
        self.registry.update(&mut self.grid, index, entry)
    }

    /// Put a previously removed index back into the grid.
    pub fn insert(&mut self, index: usize, entry: Entry) -> Result<Placement, SpatialError> {
        self.registry.insert(&mut self.grid, index, entry)
    }

    /// Remove one entity from the grid. The host's array is not touched.
    pub fn remove_one(&mut self, index: usize) -> Result<Placement, SpatialError> {
        self.registry.remove(&mut self.grid, index)
    }

    /// Remove several entities. The whole batch is checked first: an index out
    /// of range, not tracked, or listed twice fails the call with nothing
    /// removed.
    pub fn remove(&mut self, indices: &[usize]) -> Result<(), SpatialError> {
        let capacity = self.registry.capacity();
        let mut seen = FxHashSet::default();
        for &index in indices {
            if index >= capacity {
                return Err(SpatialError::OutOfRange { index, capacity });
            }
            if !seen.insert(index) {
                return Err(SpatialError::DuplicateIndex(index));
            }
            if self.registry.get(index).is_none() {
                return Err(SpatialError::NotTracked(index));
            }
        }
        for &index in indices {
            self.registry.remove(&mut self.grid, index)?;
        }
        Ok(())
    }

    /// Entries within `radius` of `position`, nearest first, at most
    /// `max_count` of them. The slice is overwritten by the next search.
    pub fn search(&mut self, position: Position, radius: f32, max_count: usize) -> &[Neighbor] {
        self.results.clear();
        let searcher = Searcher {
            grid: &self.grid,
            catalog: &self.catalog,
            metric: self.config.metric,
            period: self.config.world_period(),
        };
        searcher.search_into(position, radius, max_count, &mut self.results);
        &self.results
    }

    /// Search around each of `positions`, each capped at `max_count` hits,
    /// into one shared buffer.
    pub fn search_bulk(
        &mut self,
        positions: &[Position],
        radius: f32,
        max_count: usize,
    ) -> BulkResults<'_> {
        self.results.clear();
        self.counts.clear();

        if positions.is_empty() {
            warn!("bulk search with no query points");
            self.counts.push(0);
            return BulkResults::new(&self.counts, &self.results);
        }

        let searcher = Searcher {
            grid: &self.grid,
            catalog: &self.catalog,
            metric: self.config.metric,
            period: self.config.world_period(),
        };
        for &position in positions {
            let start = self.results.len();
            searcher.search_into(
                position,
                radius,
                start.saturating_add(max_count),
                &mut self.results,
            );
            self.counts.push((self.results.len() - start) as u32);
        }

        BulkResults::new(&self.counts, &self.results)
    }

    /// Verify that every tracked entity sits at its recorded cell and slot
    /// with the data from `entries`, and that no cell holds anything else.
    pub fn check_placements(&self, entries: &[Entry]) -> Result<(), PlacementMismatch> {
        for (index, placement) in self.registry.iter() {
            let Placement { cell, slot } = placement;
            let stored = self
                .grid
                .cell(cell as usize)
                .entries()
                .get(slot as usize)
                .ok_or(PlacementMismatch::SlotPastEnd { index, cell, slot })?;
            if stored.index as usize != index {
                return Err(PlacementMismatch::WrongOccupant {
                    index,
                    cell,
                    slot,
                    found: stored.index,
                });
            }
            if let Some(expected) = entries.get(index) {
                if stored.entry != *expected {
                    return Err(PlacementMismatch::StaleEntry { index });
                }
                if self.grid.hash(expected.position) != cell as usize {
                    return Err(PlacementMismatch::StaleCell { index, cell });
                }
            }
        }
        let stored = self.grid.entry_count();
        let tracked = self.registry.len();
        if stored != tracked {
            return Err(PlacementMismatch::CountMismatch { stored, tracked });
        }
        Ok(())
    }

    /// Cell index a position hashes to
    #[inline]
    pub fn hash(&self, position: Position) -> usize {
        self.grid.hash(position)
    }

    pub fn placement(&self, index: usize) -> Option<Placement> {
        self.registry.get(index)
    }

    pub fn is_tracked(&self, index: usize) -> bool {
        self.registry.get(index).is_some()
    }

    /// Entities currently in the grid
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Length of the entry array given at initialization
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn catalog(&self) -> &OffsetCatalog {
        &self.catalog
    }
}
