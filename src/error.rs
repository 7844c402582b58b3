//! Error types for ringhash.
//!
//! This module provides error types for grid configuration, offset geometry
//! loading, and the placement and handle operations that can fail.

use std::fmt;

use crate::handle::Handle;

/// Errors that can occur when validating a [`SpatialConfig`](crate::SpatialConfig).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Grid side length of zero was requested.
    ZeroSideLength,
    /// Grid side length is not a power of two.
    SideLengthNotPowerOfTwo(u32),
    /// Side exponent is outside `1..=MAX_SIDE_EXPONENT`.
    SideExponentOutOfRange(u32),
    /// Cell size is not a finite positive number.
    InvalidCellSize(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSideLength => write!(f, "Grid side length must not be zero"),
            ConfigError::SideLengthNotPowerOfTwo(n) => {
                write!(f, "Grid side length must be a power of two, got {}", n)
            }
            ConfigError::SideExponentOutOfRange(e) => write!(
                f,
                "Grid side exponent must be in 1..={}, got {}",
                crate::config::MAX_SIDE_EXPONENT,
                e
            ),
            ConfigError::InvalidCellSize(s) => {
                write!(f, "Cell size must be finite and greater than zero, got {}", s)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur while reading or decoding offset geometry.
#[derive(Debug)]
pub enum GeometryError {
    /// Failed to read or write the geometry file.
    Io(std::io::Error),
    /// The blob ended before a complete value could be read.
    Truncated { offset: usize, needed: usize },
    /// A step or pair count was negative.
    NegativeCount { offset: usize, value: i32 },
    /// Bytes were left over after the last declared step.
    TrailingBytes(usize),
    /// The geometry declares no offsets at all.
    Empty,
    /// Requested generator distance exceeds
    /// [`MAX_GENERATED_DISTANCE`](crate::geometry::MAX_GENERATED_DISTANCE).
    DistanceTooLarge(u32),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::Io(e) => write!(f, "Failed to access geometry file: {}", e),
            GeometryError::Truncated { offset, needed } => write!(
                f,
                "Geometry blob truncated at byte {} ({} more bytes needed)",
                offset, needed
            ),
            GeometryError::NegativeCount { offset, value } => {
                write!(f, "Negative count {} at byte {} of geometry blob", value, offset)
            }
            GeometryError::TrailingBytes(n) => {
                write!(f, "Geometry blob has {} unexpected trailing bytes", n)
            }
            GeometryError::Empty => {
                write!(f, "Geometry contains no offsets, every query would be empty")
            }
            GeometryError::DistanceTooLarge(d) => write!(
                f,
                "Cannot generate geometry for distance {} (maximum {})",
                d,
                crate::geometry::MAX_GENERATED_DISTANCE
            ),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        GeometryError::Io(e)
    }
}

/// Errors reported by [`SpatialHash`](crate::SpatialHash) and
/// [`HandleTable`](crate::HandleTable) operations.
#[derive(Debug)]
pub enum SpatialError {
    /// The grid configuration was rejected.
    InvalidConfiguration(ConfigError),
    /// Offset geometry was absent or malformed.
    MissingGeometry(GeometryError),
    /// An entity index exceeds the initialized capacity.
    OutOfRange { index: usize, capacity: usize },
    /// The entity at this index is not currently in the grid.
    NotTracked(usize),
    /// The entity at this index is already in the grid.
    AlreadyTracked(usize),
    /// The entry slice does not have the length given at initialization.
    LengthMismatch { expected: usize, actual: usize },
    /// The same index appears twice in one removal batch.
    DuplicateIndex(usize),
    /// The handle was destroyed or never issued.
    StaleHandle(Handle),
}

impl fmt::Display for SpatialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialError::InvalidConfiguration(e) => write!(f, "Invalid configuration: {}", e),
            SpatialError::MissingGeometry(e) => write!(f, "Missing offset geometry: {}", e),
            SpatialError::OutOfRange { index, capacity } => write!(
                f,
                "Entity index {} is out of range (capacity {})",
                index, capacity
            ),
            SpatialError::NotTracked(index) => write!(f, "Entity {} is not in the grid", index),
            SpatialError::AlreadyTracked(index) => {
                write!(f, "Entity {} is already in the grid", index)
            }
            SpatialError::LengthMismatch { expected, actual } => write!(
                f,
                "Expected {} entries (as initialized), got {}",
                expected, actual
            ),
            SpatialError::DuplicateIndex(index) => {
                write!(f, "Entity {} is listed more than once", index)
            }
            SpatialError::StaleHandle(h) => write!(f, "Stale or unknown handle {}", h),
        }
    }
}

impl std::error::Error for SpatialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpatialError::InvalidConfiguration(e) => Some(e),
            SpatialError::MissingGeometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SpatialError {
    fn from(e: ConfigError) -> Self {
        SpatialError::InvalidConfiguration(e)
    }
}

impl From<GeometryError> for SpatialError {
    fn from(e: GeometryError) -> Self {
        SpatialError::MissingGeometry(e)
    }
}

/// A broken placement found by
/// [`SpatialHash::check_placements`](crate::SpatialHash::check_placements).
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementMismatch {
    /// The recorded slot is past the end of the recorded cell.
    SlotPastEnd { index: usize, cell: u32, slot: u32 },
    /// The recorded slot holds another entity.
    WrongOccupant {
        index: usize,
        cell: u32,
        slot: u32,
        found: u32,
    },
    /// The stored copy differs from the host's entry.
    StaleEntry { index: usize },
    /// The host's position hashes to a different cell than the recorded one.
    StaleCell { index: usize, cell: u32 },
    /// Cells hold a different number of entries than are tracked.
    CountMismatch { stored: usize, tracked: usize },
}

impl fmt::Display for PlacementMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementMismatch::SlotPastEnd { index, cell, slot } => write!(
                f,
                "Entity {}: slot {} is past the end of cell {}",
                index, slot, cell
            ),
            PlacementMismatch::WrongOccupant {
                index,
                cell,
                slot,
                found,
            } => write!(
                f,
                "Entity {}: cell {} slot {} holds entity {}",
                index, cell, slot, found
            ),
            PlacementMismatch::StaleEntry { index } => {
                write!(f, "Entity {}: stored copy differs from the host entry", index)
            }
            PlacementMismatch::StaleCell { index, cell } => {
                write!(f, "Entity {}: recorded cell {} is stale", index, cell)
            }
            PlacementMismatch::CountMismatch { stored, tracked } => write!(
                f,
                "{} entries stored in cells but {} tracked",
                stored, tracked
            ),
        }
    }
}

impl std::error::Error for PlacementMismatch {}
