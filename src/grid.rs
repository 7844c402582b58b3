//! The toroidal cell array and the position hash.

use crate::catalog::{OffsetCatalog, RingListId};
use crate::config::SpatialConfig;
use crate::entry::{Entry, Position};

/// An entry stored in a cell, tagged with its index in the host's entry
/// array so its placement can be fixed up when it is moved.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellEntry {
    pub entry: Entry,
    pub index: u32,
}

/// One bucket of the grid.
#[derive(Clone, Debug)]
pub struct Cell {
    pub(crate) entries: Vec<CellEntry>,
    rings: RingListId,
}

impl Cell {
    #[inline]
    pub fn entries(&self) -> &[CellEntry] {
        &self.entries
    }

    /// Ring list used when a search starts in this cell
    #[inline]
    pub fn rings(&self) -> RingListId {
        self.rings
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A `side_length x side_length` torus of cells.
///
/// Cell `(x, y)` lives at index `x + y * side_length`. Positions anywhere in
/// the plane hash onto the torus, so far-apart positions can share a cell.
pub struct Grid {
    side_length: u32,
    mask: i32,
    inv_cell_size: f32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid whose cells reference `catalog`'s ring lists.
    ///
    /// `config` must already be validated.
    pub fn new(config: &SpatialConfig, catalog: &OffsetCatalog) -> Self {
        let side_length = config.side_length();
        let cells = (0..config.total_cells())
            .map(|i| Cell {
                entries: Vec::with_capacity(config.cell_capacity),
                rings: catalog.ring_list_of(i),
            })
            .collect();

        Self {
            side_length,
            mask: side_length as i32 - 1,
            inv_cell_size: 1.0 / config.cell_size,
            cells,
        }
    }

    /// Cell index for a position. Always in `[0, side_length²)`.
    #[inline]
    pub fn hash(&self, position: Position) -> usize {
        self.hash_xy(position.x, position.y)
    }

    #[inline]
    pub fn hash_xy(&self, x: f32, y: f32) -> usize {
        // floor, not truncation, so negative coordinates keep wrapping
        // cell by cell instead of folding onto cell 0
        let cx = (x * self.inv_cell_size).floor() as i32 & self.mask;
        let cy = (y * self.inv_cell_size).floor() as i32 & self.mask;
        (cx + cy * self.side_length as i32) as usize
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn side_length(&self) -> u32 {
        self.side_length
    }

    /// Empty every cell, keeping allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.entries.clear();
        }
    }

    /// Entries stored across all cells
    pub fn entry_count(&self) -> usize {
        self.cells.iter().map(Cell::len).sum()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}
