//! Offset catalog: per-cell ring groups, localized and deduplicated.
//!
//! Every cell walks the same unlocalized geometry, but near the wrap
//! boundaries the translated offsets come out different. Each localized step
//! is stored once as a *shape* (a slice of linear cell deltas), and each
//! cell's ordered list of shapes is stored once as a *ring list*. Interior
//! cells all share one ring list.

use glam::IVec2;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::geometry::RawGeometry;

/// Index of a deduplicated step shape.
pub type ShapeId = u32;

/// Index of a deduplicated per-cell ring list.
pub type RingListId = u32;

/// Precomputed ring groups for every cell of a toroidal grid.
pub struct OffsetCatalog {
    side_length: u32,
    shapes: Vec<Box<[i32]>>,
    ring_lists: Vec<Box<[ShapeId]>>,
    cell_rings: Vec<RingListId>,
}

impl OffsetCatalog {
    /// Localize `geometry` for a `2^side_exponent` square grid.
    ///
    /// If no step contains the center offset, a center-only step is put in
    /// front so a query always examines its own cell. A concrete cell reached
    /// by more than one offset is kept only at its first occurrence.
    pub fn build(side_exponent: u32, geometry: &RawGeometry) -> Self {
        let side_length = 1u32 << side_exponent;
        let mask = side_length as i32 - 1;
        let total = (side_length * side_length) as usize;

        let center_step = [IVec2::ZERO];
        let prefix: &[IVec2] = if geometry.contains_center() { &[] } else { &center_step };
        let steps: Vec<&[IVec2]> = std::iter::once(prefix)
            .filter(|s| !s.is_empty())
            .chain(geometry.steps().iter().map(Vec::as_slice))
            .collect();

        let mut shapes: Vec<Box<[i32]>> = Vec::new();
        let mut shape_ids: FxHashMap<Box<[i32]>, ShapeId> = FxHashMap::default();
        let mut ring_lists: Vec<Box<[ShapeId]>> = Vec::new();
        let mut list_ids: FxHashMap<Box<[ShapeId]>, RingListId> = FxHashMap::default();
        let mut cell_rings = Vec::with_capacity(total);

        // visited[target] == stamp marks a cell already claimed by the
        // current center
        let mut visited = vec![0u32; total];
        let mut candidate: Vec<i32> = Vec::new();
        let mut list: Vec<ShapeId> = Vec::with_capacity(steps.len());

        for y in 0..side_length as i32 {
            for x in 0..side_length as i32 {
                let center = x + y * side_length as i32;
                let stamp = center as u32 + 1;
                list.clear();

                for step in &steps {
                    candidate.clear();
                    for offset in step.iter() {
                        let tx = x.wrapping_add(offset.x) & mask;
                        let ty = y.wrapping_add(offset.y) & mask;
                        let target = tx + ty * side_length as i32;
                        if visited[target as usize] == stamp {
                            continue;
                        }
                        visited[target as usize] = stamp;
                        candidate.push(target - center);
                    }
                    list.push(intern(&mut shapes, &mut shape_ids, &candidate));
                }

                cell_rings.push(intern(&mut ring_lists, &mut list_ids, &list));
            }
        }

        debug!(
            side_length,
            steps = steps.len(),
            shapes = shapes.len(),
            ring_lists = ring_lists.len(),
            "offset catalog built"
        );

        Self {
            side_length,
            shapes,
            ring_lists,
            cell_rings,
        }
    }

    /// Ring list referenced by `cell`
    #[inline]
    pub fn ring_list_of(&self, cell: usize) -> RingListId {
        self.cell_rings[cell]
    }

    /// Steps of a ring list, innermost first. Each step is a slice of linear
    /// deltas to add to the center cell index.
    #[inline]
    pub fn steps(&self, list: RingListId) -> impl Iterator<Item = &[i32]> + '_ {
        self.ring_lists[list as usize]
            .iter()
            .map(move |&shape| &*self.shapes[shape as usize])
    }

    pub fn side_length(&self) -> u32 {
        self.side_length
    }

    /// Steps walked per cell (identical for every cell)
    pub fn step_count(&self) -> usize {
        self.ring_lists.first().map_or(0, |l| l.len())
    }

    /// Distinct step shapes stored
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Distinct ring lists stored
    pub fn ring_list_count(&self) -> usize {
        self.ring_lists.len()
    }
}

/// Return the id of `value` in `store`, adding it if no equal value exists.
fn intern<T: Copy + Eq + std::hash::Hash>(
    store: &mut Vec<Box<[T]>>,
    ids: &mut FxHashMap<Box<[T]>, u32>,
    value: &[T],
) -> u32 {
    if let Some(&id) = ids.get(value) {
        return id;
    }
    let id = store.len() as u32;
    let boxed: Box<[T]> = value.into();
    store.push(boxed.clone());
    ids.insert(boxed, id);
    id
}
