//! Ring-expanding proximity search.
//!
//! A search starts at the query point's cell and walks that cell's ring list
//! innermost step first. Every entry in a visited cell is tested against the
//! radius with the configured metric; hits from one step are insertion-sorted
//! into the already sorted hits and the walk stops as soon as a completed step
//! leaves at least `max_count` hits.
//!
//! Filtering by radius is exact. Ranking is approximate: the walk assumes step
//! order follows true distance, which only holds roughly, so with radii much
//! larger than a cell or near the wrap seam a farther entry from an earlier
//! step can be returned in place of a nearer one from a later step.

use crate::catalog::OffsetCatalog;
use crate::config::DistanceMetric;
use crate::entry::{Neighbor, Position};
use crate::grid::Grid;

/// Read-only view of what a search needs.
pub(crate) struct Searcher<'a> {
    pub grid: &'a Grid,
    pub catalog: &'a OffsetCatalog,
    pub metric: DistanceMetric,
    pub period: f32,
}

impl Searcher<'_> {
    /// Append hits for one query point to `out`, sorted by distance among
    /// themselves. Stops once `out.len()` reaches `cap` after a full step;
    /// `cap` counts everything already in `out`.
    pub fn search_into(
        &self,
        position: Position,
        radius: f32,
        cap: usize,
        out: &mut Vec<Neighbor>,
    ) {
        let base = out.len();
        if cap <= base {
            return;
        }

        let origin = self.grid.hash(position);
        let rings = self.grid.cell(origin).rings();

        for step in self.catalog.steps(rings) {
            let sorted = out.len() - base;
            for &delta in step {
                let cell = self.grid.cell((origin as i32 + delta) as usize);
                for stored in cell.entries() {
                    let distance =
                        self.metric
                            .distance(stored.entry.position, position, self.period);
                    if distance < radius {
                        out.push(Neighbor {
                            entry: stored.entry,
                            distance,
                        });
                    }
                }
            }

            insertion_merge(&mut out[base..], sorted);

            if out.len() >= cap {
                out.truncate(cap);
                return;
            }
        }
    }
}

/// `hits[..sorted]` is already ordered; insert each later element into place.
/// Steps usually add only a handful of hits, so this beats a general sort.
fn insertion_merge(hits: &mut [Neighbor], sorted: usize) {
    for h in sorted.max(1)..hits.len() {
        let current = hits[h];
        let mut k = h;
        while k > 0 && hits[k - 1].distance > current.distance {
            hits[k] = hits[k - 1];
            k -= 1;
        }
        hits[k] = current;
    }
}

/// Results of a batched search: one shared hit buffer plus the number of
/// hits each query point contributed, in query order.
#[derive(Clone, Copy, Debug)]
pub struct BulkResults<'a> {
    counts: &'a [u32],
    neighbors: &'a [Neighbor],
}

impl<'a> BulkResults<'a> {
    pub(crate) fn new(counts: &'a [u32], neighbors: &'a [Neighbor]) -> Self {
        Self { counts, neighbors }
    }

    /// Hits per query point. A batch of zero points reports a single `0`.
    pub fn counts(&self) -> &'a [u32] {
        self.counts
    }

    /// All hits, grouped by query point
    pub fn neighbors(&self) -> &'a [Neighbor] {
        self.neighbors
    }

    /// The hit buffer as raw bytes, 16 per hit
    pub fn as_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.neighbors)
    }

    /// Number of entries in [`counts`](Self::counts)
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when no query point had any hit
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Hits of the `i`-th query point
    pub fn get(&self, i: usize) -> Option<&'a [Neighbor]> {
        let count = *self.counts.get(i)? as usize;
        let start: usize = self.counts[..i].iter().map(|&c| c as usize).sum();
        self.neighbors.get(start..start + count)
    }

    /// Per-point hit slices, in query order
    pub fn iter(&self) -> impl Iterator<Item = &'a [Neighbor]> + 'a {
        let neighbors = self.neighbors;
        self.counts.iter().scan(0usize, move |start, &count| {
            let slice = &neighbors[*start..*start + count as usize];
            *start += count as usize;
            Some(slice)
        })
    }
}
