//! Grid configuration.

use glam::Vec2;

use crate::error::ConfigError;

/// Largest supported side exponent. Keeps `side²` and every linear cell
/// delta inside `i32`.
pub const MAX_SIDE_EXPONENT: u32 = 15;

/// How the distance between a query point and an entry is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Plain Euclidean distance in world space.
    #[default]
    Euclidean,
    /// Euclidean distance with each axis difference wrapped by the grid's
    /// world period (`side_length * cell_size`).
    Toroidal,
}

impl DistanceMetric {
    /// Distance between `a` and `b`. `period` is the grid's world period and
    /// only matters for [`DistanceMetric::Toroidal`].
    #[inline]
    pub fn distance(self, a: Vec2, b: Vec2, period: f32) -> f32 {
        match self {
            DistanceMetric::Euclidean => a.distance(b),
            DistanceMetric::Toroidal => {
                let wrap = |d: f32| {
                    let d = d.abs().rem_euclid(period);
                    d.min(period - d)
                };
                let delta = a - b;
                Vec2::new(wrap(delta.x), wrap(delta.y)).length()
            }
        }
    }
}

/// Configuration for the spatial hash grid
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialConfig {
    /// Grid side length is `1 << side_exponent`
    pub side_exponent: u32,
    /// Size of each cell in world units
    pub cell_size: f32,
    /// Distance used for threshold filtering and ordering
    #[cfg_attr(feature = "serde", serde(default))]
    pub metric: DistanceMetric,
    /// Entries reserved per cell up front
    #[cfg_attr(feature = "serde", serde(default = "default_cell_capacity"))]
    pub cell_capacity: usize,
    /// Initial reservation for the query result buffer
    #[cfg_attr(feature = "serde", serde(default = "default_result_capacity"))]
    pub result_capacity: usize,
}

#[cfg(feature = "serde")]
fn default_cell_capacity() -> usize {
    8
}

#[cfg(feature = "serde")]
fn default_result_capacity() -> usize {
    100
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            side_exponent: 6, // 64x64 cells
            cell_size: 1.0,
            metric: DistanceMetric::Euclidean,
            cell_capacity: 8,
            result_capacity: 100,
        }
    }
}

impl SpatialConfig {
    pub fn new(side_exponent: u32, cell_size: f32) -> Self {
        Self {
            side_exponent,
            cell_size,
            ..Self::default()
        }
    }

    /// Build a config from an explicit side length, which must be a nonzero
    /// power of two. Never rounds.
    pub fn from_side_length(side_length: u32, cell_size: f32) -> Result<Self, ConfigError> {
        if side_length == 0 {
            return Err(ConfigError::ZeroSideLength);
        }
        if !side_length.is_power_of_two() {
            return Err(ConfigError::SideLengthNotPowerOfTwo(side_length));
        }
        let config = Self::new(side_length.trailing_zeros(), cell_size);
        config.validate()?;
        Ok(config)
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_cell_capacity(mut self, capacity: usize) -> Self {
        self.cell_capacity = capacity;
        self
    }

    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.side_exponent == 0 || self.side_exponent > MAX_SIDE_EXPONENT {
            return Err(ConfigError::SideExponentOutOfRange(self.side_exponent));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }

    /// Number of cells along one side of the grid
    #[inline]
    pub fn side_length(&self) -> u32 {
        1 << self.side_exponent
    }

    /// Total number of cells in the grid
    pub fn total_cells(&self) -> usize {
        let side = self.side_length() as usize;
        side * side
    }

    /// World-space extent after which positions wrap onto the same cells
    pub fn world_period(&self) -> f32 {
        self.side_length() as f32 * self.cell_size
    }

    /// Save this config as pretty JSON.
    #[cfg(feature = "serde")]
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a config from a JSON file.
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
