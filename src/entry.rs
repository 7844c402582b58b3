//! Entity records shared between the host and the grid.
//!
//! Both types are `#[repr(C)]` and [`Pod`] so a host can hand over or read
//! back flat buffers without conversion.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// A 2D position in world units.
pub type Position = Vec2;

/// An entity as owned by the host: a stable id plus its current position.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Entry {
    pub id: u32,
    pub position: Position,
}

impl Entry {
    pub fn new(id: u32, position: Position) -> Self {
        Self { id, position }
    }
}

/// A query hit: a copy of the entry and its distance to the query point.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Neighbor {
    pub entry: Entry,
    pub distance: f32,
}

impl Neighbor {
    #[inline]
    pub fn id(&self) -> u32 {
        self.entry.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_layout() {
        // id, x, y
        assert_eq!(std::mem::size_of::<Entry>(), 12);
        // id, x, y, distance
        assert_eq!(std::mem::size_of::<Neighbor>(), 16);
    }

    #[test]
    fn test_entry_from_bytes() {
        let words: [u32; 3] = [7, 1.5f32.to_bits(), (-2.0f32).to_bits()];
        let entry: Entry = bytemuck::cast(words);
        assert_eq!(entry, Entry::new(7, Vec2::new(1.5, -2.0)));
    }
}
