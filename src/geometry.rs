//! Unlocalized neighbor-offset geometry.
//!
//! Geometry is a list of steps, each a set of `(dx, dy)` cell offsets relative
//! to a center cell on an unbounded grid. Steps are ordered by increasing
//! distance band; the [`OffsetCatalog`](crate::OffsetCatalog) localizes them to
//! a concrete toroidal grid.
//!
//! # Blob layout
//!
//! All values are little-endian 32-bit words:
//!
//! ```text
//! i32 step_count
//! repeat step_count times:
//!     i32 pair_count
//!     repeat pair_count times:
//!         u32 dx   (two's complement of the signed offset)
//!         u32 dy
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::IVec2;

use crate::error::GeometryError;

const WORD: usize = 4;

/// Largest distance [`RawGeometry::generate`] accepts. The offset count grows
/// with the square of the distance; 256 already yields about 265k offsets.
pub const MAX_GENERATED_DISTANCE: u32 = 256;

/// Offset steps not yet bound to any grid size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawGeometry {
    steps: Vec<Vec<IVec2>>,
}

impl RawGeometry {
    /// Wrap explicit steps. Fails with [`GeometryError::Empty`] when no step
    /// holds any offset.
    pub fn from_steps(steps: Vec<Vec<IVec2>>) -> Result<Self, GeometryError> {
        let geometry = Self { steps };
        if geometry.offset_count() == 0 {
            return Err(GeometryError::Empty);
        }
        Ok(geometry)
    }

    /// Generate distance bands covering every cell whose nearest point lies
    /// within `max_distance` cells of the center cell.
    ///
    /// A cell at offset `(dx, dy)` is banded by the squared minimum distance
    /// between it and the center cell, `max(|dx|-1, 0)² + max(|dy|-1, 0)²`.
    /// The first band is the full 3x3 block, center included. Offsets inside a
    /// band are in row-major order.
    ///
    /// Fails with [`GeometryError::DistanceTooLarge`] above
    /// [`MAX_GENERATED_DISTANCE`].
    pub fn generate(max_distance: u32) -> Result<Self, GeometryError> {
        if max_distance > MAX_GENERATED_DISTANCE {
            return Err(GeometryError::DistanceTooLarge(max_distance));
        }
        let reach = max_distance as i32 + 1;
        let limit = max_distance * max_distance;
        let mut bands: BTreeMap<u32, Vec<IVec2>> = BTreeMap::new();

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let band = band_key(dx, dy);
                if band <= limit {
                    bands.entry(band).or_default().push(IVec2::new(dx, dy));
                }
            }
        }

        Ok(Self {
            steps: bands.into_values().collect(),
        })
    }

    /// Decode a geometry blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        let mut reader = WordReader { bytes, offset: 0 };

        let step_count = reader.count()?;
        let mut steps = Vec::with_capacity(step_count.min(1024));
        for _ in 0..step_count {
            let pair_count = reader.count()?;
            let mut step = Vec::with_capacity(pair_count.min(4096));
            for _ in 0..pair_count {
                let dx = reader.word()? as i32;
                let dy = reader.word()? as i32;
                step.push(IVec2::new(dx, dy));
            }
            steps.push(step);
        }

        let rest = bytes.len() - reader.offset;
        if rest != 0 {
            return Err(GeometryError::TrailingBytes(rest));
        }
        Self::from_steps(steps)
    }

    /// Encode into the blob layout read by [`from_bytes`](Self::from_bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        let words = 1 + self.steps.len() + 2 * self.offset_count();
        let mut out = Vec::with_capacity(words * WORD);
        out.extend_from_slice(&(self.steps.len() as i32).to_le_bytes());
        for step in &self.steps {
            out.extend_from_slice(&(step.len() as i32).to_le_bytes());
            for offset in step {
                out.extend_from_slice(&(offset.x as u32).to_le_bytes());
                out.extend_from_slice(&(offset.y as u32).to_le_bytes());
            }
        }
        out
    }

    /// Read a geometry file. A missing file is an error, not empty geometry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GeometryError> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn steps(&self) -> &[Vec<IVec2>] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Total offsets across all steps
    pub fn offset_count(&self) -> usize {
        self.steps.iter().map(Vec::len).sum()
    }

    pub fn contains_center(&self) -> bool {
        self.steps.iter().flatten().any(|o| *o == IVec2::ZERO)
    }
}

/// Squared minimum distance, in cells, between the center cell and `(dx, dy)`.
fn band_key(dx: i32, dy: i32) -> u32 {
    let gap = |d: i32| (d.unsigned_abs()).saturating_sub(1);
    let (gx, gy) = (gap(dx), gap(dy));
    gx * gx + gy * gy
}

struct WordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl WordReader<'_> {
    fn word(&mut self) -> Result<u32, GeometryError> {
        let end = self.offset + WORD;
        let chunk = self
            .bytes
            .get(self.offset..end)
            .ok_or(GeometryError::Truncated {
                offset: self.offset,
                needed: end - self.bytes.len(),
            })?;
        self.offset = end;
        Ok(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }

    fn count(&mut self) -> Result<usize, GeometryError> {
        let offset = self.offset;
        let value = self.word()? as i32;
        if value < 0 {
            return Err(GeometryError::NegativeCount { offset, value });
        }
        Ok(value as usize)
    }
}
