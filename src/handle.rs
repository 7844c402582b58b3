//! Handle-based surface for hosts that drive the engine through flat buffers.
//!
//! This is a thin adapter: each call resolves a [`Handle`] to its
//! [`SpatialHash`] and forwards. Handles carry a generation, so any call made
//! with a handle after [`HandleTable::destroy`] fails with
//! [`SpatialError::StaleHandle`] even if the slot has been reused.

use std::fmt;

use tracing::debug;

use crate::config::SpatialConfig;
use crate::entry::{Entry, Position};
use crate::error::SpatialError;
use crate::geometry::RawGeometry;
use crate::query::BulkResults;
use crate::spatial_hash::SpatialHash;

/// Opaque reference to an engine owned by a [`HandleTable`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot {
    generation: u32,
    hash: Option<SpatialHash>,
}

/// Owns engines and hands out handles to them.
#[derive(Default)]
pub struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a `2^side_exponent` grid of unit cells.
    pub fn create(
        &mut self,
        side_exponent: u32,
        geometry: &RawGeometry,
    ) -> Result<Handle, SpatialError> {
        self.create_with(SpatialConfig::new(side_exponent, 1.0), geometry)
    }

    pub fn create_with(
        &mut self,
        config: SpatialConfig,
        geometry: &RawGeometry,
    ) -> Result<Handle, SpatialError> {
        let hash = SpatialHash::new(config, geometry)?;

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.hash = Some(hash);
                Handle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    hash: Some(hash),
                });
                Handle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        debug!(%handle, "handle created");
        Ok(handle)
    }

    /// Drop the engine behind `handle`. The handle and all copies of it
    /// become stale.
    pub fn destroy(&mut self, handle: Handle) -> Result<(), SpatialError> {
        let slot = self.slot_mut(handle)?;
        slot.hash = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        debug!(%handle, "handle destroyed");
        Ok(())
    }

    pub fn get(&self, handle: Handle) -> Result<&SpatialHash, SpatialError> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.hash.as_ref())
            .ok_or(SpatialError::StaleHandle(handle))
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut SpatialHash, SpatialError> {
        self.slot_mut(handle)?
            .hash
            .as_mut()
            .ok_or(SpatialError::StaleHandle(handle))
    }

    pub fn initialize(&mut self, handle: Handle, entries: &[Entry]) -> Result<(), SpatialError> {
        self.get_mut(handle)?.initialize(entries);
        Ok(())
    }

    pub fn update_all(&mut self, handle: Handle, entries: &[Entry]) -> Result<usize, SpatialError> {
        self.get_mut(handle)?.update_all(entries)
    }

    /// Remove entities by their index in the entry array.
    pub fn remove(&mut self, handle: Handle, ids: &[u32]) -> Result<(), SpatialError> {
        let indices: Vec<usize> = ids.iter().map(|&i| i as usize).collect();
        self.get_mut(handle)?.remove(&indices)
    }

    pub fn search(
        &mut self,
        handle: Handle,
        positions: &[Position],
        radius: f32,
        max_count: usize,
    ) -> Result<BulkResults<'_>, SpatialError> {
        Ok(self.get_mut(handle)?.search_bulk(positions, radius, max_count))
    }

    /// Live engines
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, handle: Handle) -> Result<&mut Slot, SpatialError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.hash.is_some())
            .ok_or(SpatialError::StaleHandle(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_create_and_destroy() {
        let mut table = HandleTable::new();
        let geometry = RawGeometry::generate(1).unwrap();
        let a = table.create(3, &geometry).unwrap();
        let b = table.create(4, &geometry).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(b).unwrap().config().side_length(), 16);

        table.destroy(a).unwrap();
        assert_eq!(table.len(), 1);
        assert!(matches!(table.get(a), Err(SpatialError::StaleHandle(h)) if h == a));
        assert!(matches!(table.destroy(a), Err(SpatialError::StaleHandle(_))));
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let mut table = HandleTable::new();
        let geometry = RawGeometry::generate(1).unwrap();
        let old = table.create(3, &geometry).unwrap();
        table.destroy(old).unwrap();
        let new = table.create(3, &geometry).unwrap();

        assert_ne!(old, new);
        assert!(table.get(new).is_ok());
        assert!(matches!(
            table.initialize(old, &[Entry::new(1, Vec2::ZERO)]),
            Err(SpatialError::StaleHandle(_))
        ));
        assert!(matches!(
            table.search(old, &[Vec2::ZERO], 1.0, 1),
            Err(SpatialError::StaleHandle(_))
        ));
    }

    #[test]
    fn test_create_rejects_bad_exponent() {
        let mut table = HandleTable::new();
        assert!(matches!(
            table.create(0, &RawGeometry::generate(1).unwrap()),
            Err(SpatialError::InvalidConfiguration(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_handle_display() {
        let mut table = HandleTable::new();
        let handle = table.create(2, &RawGeometry::generate(0).unwrap()).unwrap();
        assert_eq!(handle.to_string(), "0v0");
    }
}
