//! Placement registry: which cell and slot hold each entity.
//!
//! The registry is the only writer of cell contents. For every tracked index
//! `i` with placement `p`, `grid.cell(p.cell).entries()[p.slot]` is the entry
//! for `i`; every operation here keeps that true.

use tracing::trace;

use crate::entry::Entry;
use crate::error::SpatialError;
use crate::grid::{CellEntry, Grid};

/// Where an entity currently sits in the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub cell: u32,
    pub slot: u32,
}

/// Result of re-hashing one entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Same cell; the stored copy was overwritten in place.
    Unchanged,
    /// Moved to a different cell.
    Relocated { from: u32, to: u32 },
}

/// Per-entity placement bookkeeping, indexed like the host's entry array.
#[derive(Clone, Debug, Default)]
pub struct PlacementRegistry {
    placements: Vec<Option<Placement>>,
    tracked: usize,
}

impl PlacementRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            placements: vec![None; capacity],
            tracked: 0,
        }
    }

    /// Number of indices this registry was sized for
    #[inline]
    pub fn capacity(&self) -> usize {
        self.placements.len()
    }

    /// Number of entities currently in the grid
    #[inline]
    pub fn len(&self) -> usize {
        self.tracked
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracked == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Placement> {
        self.placements.get(index).copied().flatten()
    }

    /// Tracked indices with their placements, in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, Placement)> + '_ {
        self.placements
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
    }

    fn check_range(&self, index: usize) -> Result<(), SpatialError> {
        if index >= self.placements.len() {
            return Err(SpatialError::OutOfRange {
                index,
                capacity: self.placements.len(),
            });
        }
        Ok(())
    }

    /// Track every entry, index `i` taking `entries[i]`. The grid must hold
    /// nothing tracked by this registry.
    pub(crate) fn track_all(&mut self, grid: &mut Grid, entries: &[Entry]) {
        self.placements.clear();
        self.placements.extend(
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| Some(push(grid, index, *entry))),
        );
        self.tracked = entries.len();
    }

    /// Hash `entry` into the grid and record where it landed.
    pub fn insert(
        &mut self,
        grid: &mut Grid,
        index: usize,
        entry: Entry,
    ) -> Result<Placement, SpatialError> {
        self.check_range(index)?;
        if self.placements[index].is_some() {
            return Err(SpatialError::AlreadyTracked(index));
        }
        let placement = push(grid, index, entry);
        self.placements[index] = Some(placement);
        self.tracked += 1;
        Ok(placement)
    }

    /// Take an entity out of the grid by swap-remove. The cell's last entry
    /// moves into the freed slot and its placement is updated to match.
    pub fn remove(&mut self, grid: &mut Grid, index: usize) -> Result<Placement, SpatialError> {
        self.check_range(index)?;
        let placement = self.placements[index]
            .take()
            .ok_or(SpatialError::NotTracked(index))?;
        self.tracked -= 1;
        self.unlink(grid, placement);
        Ok(placement)
    }

    /// Re-hash an entity from its current position.
    pub fn update(
        &mut self,
        grid: &mut Grid,
        index: usize,
        entry: Entry,
    ) -> Result<UpdateOutcome, SpatialError> {
        self.check_range(index)?;
        let placement = self.placements[index].ok_or(SpatialError::NotTracked(index))?;

        let cell = grid.hash(entry.position) as u32;
        if cell == placement.cell {
            grid.cell_mut(cell as usize).entries[placement.slot as usize].entry = entry;
            return Ok(UpdateOutcome::Unchanged);
        }

        self.unlink(grid, placement);
        let moved = push(grid, index, entry);
        self.placements[index] = Some(moved);
        trace!(id = entry.id, from = placement.cell, to = cell, "entity relocated");

        Ok(UpdateOutcome::Relocated {
            from: placement.cell,
            to: cell,
        })
    }

    /// Swap-remove the entry at `placement` and repair the displaced entry's slot.
    fn unlink(&mut self, grid: &mut Grid, placement: Placement) {
        let entries = &mut grid.cell_mut(placement.cell as usize).entries;
        let slot = placement.slot as usize;
        entries.swap_remove(slot);
        if let Some(displaced) = entries.get(slot) {
            if let Some(p) = &mut self.placements[displaced.index as usize] {
                p.slot = slot as u32;
            }
        }
    }
}

fn push(grid: &mut Grid, index: usize, entry: Entry) -> Placement {
    let cell = grid.hash(entry.position);
    let entries = &mut grid.cell_mut(cell).entries;
    entries.push(CellEntry {
        entry,
        index: index as u32,
    });
    Placement {
        cell: cell as u32,
        slot: (entries.len() - 1) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OffsetCatalog;
    use crate::config::SpatialConfig;
    use crate::geometry::RawGeometry;
    use glam::Vec2;

    fn grid() -> Grid {
        let config = SpatialConfig::new(3, 1.0);
        Grid::new(&config, &OffsetCatalog::build(3, &RawGeometry::generate(1).unwrap()))
    }

    fn entry(id: u32, x: f32, y: f32) -> Entry {
        Entry::new(id, Vec2::new(x, y))
    }

    fn assert_consistent(registry: &PlacementRegistry, grid: &Grid) {
        for (index, p) in registry.iter() {
            let stored = grid.cell(p.cell as usize).entries()[p.slot as usize];
            assert_eq!(stored.index as usize, index);
        }
        assert_eq!(grid.entry_count(), registry.len());
    }

    #[test]
    fn test_insert_records_slot() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(3);
        let a = registry.insert(&mut grid, 0, entry(10, 0.5, 0.5)).unwrap();
        let b = registry.insert(&mut grid, 1, entry(11, 0.7, 0.2)).unwrap();
        let c = registry.insert(&mut grid, 2, entry(12, 2.5, 0.5)).unwrap();

        assert_eq!(a, Placement { cell: 0, slot: 0 });
        assert_eq!(b, Placement { cell: 0, slot: 1 });
        assert_eq!(c, Placement { cell: 2, slot: 0 });
        assert_eq!(registry.len(), 3);
        assert_consistent(&registry, &grid);
    }

    #[test]
    fn test_remove_last_slot_truncates() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(2);
        registry.insert(&mut grid, 0, entry(1, 0.1, 0.1)).unwrap();
        registry.insert(&mut grid, 1, entry(2, 0.2, 0.2)).unwrap();

        registry.remove(&mut grid, 1).unwrap();
        assert_eq!(grid.cell(0).len(), 1);
        assert_eq!(registry.get(0), Some(Placement { cell: 0, slot: 0 }));
        assert_eq!(registry.get(1), None);
        assert_consistent(&registry, &grid);
    }

    #[test]
    fn test_remove_relocates_last_entry() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(4);
        for i in 0..4 {
            registry.insert(&mut grid, i, entry(i as u32, 0.1 * i as f32, 0.5)).unwrap();
        }

        registry.remove(&mut grid, 1).unwrap();

        // Index 3 was last and fills slot 1; 0 and 2 keep their slots
        assert_eq!(registry.get(3), Some(Placement { cell: 0, slot: 1 }));
        assert_eq!(registry.get(0), Some(Placement { cell: 0, slot: 0 }));
        assert_eq!(registry.get(2), Some(Placement { cell: 0, slot: 2 }));
        assert_eq!(grid.cell(0).entries()[1].entry.id, 3);
        assert_consistent(&registry, &grid);
    }

    #[test]
    fn test_update_in_place() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(1);
        registry.insert(&mut grid, 0, entry(5, 1.1, 1.1)).unwrap();

        let outcome = registry.update(&mut grid, 0, entry(5, 1.9, 1.2)).unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(registry.get(0), Some(Placement { cell: 9, slot: 0 }));
        assert_eq!(grid.cell(9).entries()[0].entry.position, Vec2::new(1.9, 1.2));
    }

    #[test]
    fn test_update_relocates() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(3);
        registry.insert(&mut grid, 0, entry(0, 0.5, 0.5)).unwrap();
        registry.insert(&mut grid, 1, entry(1, 0.6, 0.5)).unwrap();
        registry.insert(&mut grid, 2, entry(2, 1.5, 0.5)).unwrap();

        let outcome = registry.update(&mut grid, 0, entry(0, 1.4, 0.4)).unwrap();
        assert_eq!(outcome, UpdateOutcome::Relocated { from: 0, to: 1 });
        assert_eq!(registry.get(0), Some(Placement { cell: 1, slot: 1 }));
        assert_eq!(registry.get(1), Some(Placement { cell: 0, slot: 0 }));
        assert_consistent(&registry, &grid);
    }

    #[test]
    fn test_track_all_replaces_previous_state() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(5);
        registry.insert(&mut grid, 4, entry(9, 6.5, 6.5)).unwrap();
        grid.clear();

        let entries = [entry(0, 0.5, 0.5), entry(1, 0.6, 0.4), entry(2, 3.5, 1.5)];
        registry.track_all(&mut grid, &entries);

        assert_eq!(registry.capacity(), 3);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(1), Some(Placement { cell: 0, slot: 1 }));
        assert_eq!(registry.get(2), Some(Placement { cell: 11, slot: 0 }));
        assert_consistent(&registry, &grid);
    }

    #[test]
    fn test_errors() {
        let mut grid = grid();
        let mut registry = PlacementRegistry::with_capacity(1);
        assert!(matches!(
            registry.insert(&mut grid, 1, entry(0, 0.0, 0.0)),
            Err(SpatialError::OutOfRange { index: 1, capacity: 1 })
        ));
        assert!(matches!(
            registry.remove(&mut grid, 0),
            Err(SpatialError::NotTracked(0))
        ));
        registry.insert(&mut grid, 0, entry(0, 0.0, 0.0)).unwrap();
        assert!(matches!(
            registry.insert(&mut grid, 0, entry(0, 0.0, 0.0)),
            Err(SpatialError::AlreadyTracked(0))
        ));
        assert!(matches!(
            registry.update(&mut grid, 7, entry(0, 0.0, 0.0)),
            Err(SpatialError::OutOfRange { index: 7, .. })
        ));
        assert_consistent(&registry, &grid);
    }
}
