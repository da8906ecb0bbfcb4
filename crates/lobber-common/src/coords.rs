//! Grid cells, world positions and height units.
//!
//! The world is a flat array of square cells addressed by a single
//! [`GridNo`]. Horizontal positions are measured in world units
//! (`cell_size` units per cell); vertical positions are measured in height
//! units, [`HEIGHT_UNITS`] per building level. Screen-space heights use
//! pixels, [`PIXELS_PER_LEVEL`] per level.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Height units in one building level.
pub const HEIGHT_UNITS: f32 = 256.0;

/// Screen pixels in one building level.
pub const PIXELS_PER_LEVEL: f32 = 50.0;

/// Converts a pixel height to height units.
#[must_use]
pub fn pixels_to_height_units(pixels: f32) -> f32 {
    pixels * HEIGHT_UNITS / PIXELS_PER_LEVEL
}

/// Converts height units to a pixel height.
#[must_use]
pub fn height_units_to_pixels(height: f32) -> f32 {
    height * PIXELS_PER_LEVEL / HEIGHT_UNITS
}

/// Building level an object at height `z` (above the land surface) sits on.
///
/// A small tolerance lets an object resting a few units under a roof line
/// still count as being on that roof.
#[must_use]
pub fn object_level(z: f32) -> u8 {
    let level = ((z + 10.0) / HEIGHT_UNITS).trunc();
    level.clamp(0.0, f32::from(u8::MAX)) as u8
}

/// Linear index of a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridNo(u32);

impl GridNo {
    /// Creates a grid number from a raw linear index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw linear index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GridNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dimensions of a tile map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Number of columns
    pub cols: u32,
    /// Number of rows
    pub rows: u32,
    /// World units per cell edge
    pub cell_size: f32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl GridGeometry {
    /// The standard 160x160 tactical map with 10-unit cells.
    pub const STANDARD: Self = Self {
        cols: 160,
        rows: 160,
        cell_size: 10.0,
    };

    /// Creates a map geometry, rejecting empty maps and degenerate cells.
    pub fn new(cols: u32, rows: u32, cell_size: f32) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 || cell_size <= 0.0 || cols.checked_mul(rows).is_none() {
            return Err(GridError::InvalidDimensions { cols, rows });
        }
        Ok(Self {
            cols,
            rows,
            cell_size,
        })
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// Grid number of a column/row pair, if it lies on the map.
    #[must_use]
    pub fn grid_no(&self, col: i32, row: i32) -> Option<GridNo> {
        if col < 0 || row < 0 || col as u32 >= self.cols || row as u32 >= self.rows {
            return None;
        }
        Some(GridNo(row as u32 * self.cols + col as u32))
    }

    /// Like [`grid_no`](Self::grid_no), reporting the bad coordinates.
    pub fn checked_grid_no(&self, col: i32, row: i32) -> Result<GridNo, GridError> {
        self.grid_no(col, row)
            .ok_or(GridError::OutOfBounds { col, row })
    }

    /// Returns true if the grid number addresses a cell of this map.
    #[must_use]
    pub const fn contains(&self, grid: GridNo) -> bool {
        grid.0 < self.cell_count()
    }

    /// Column and row of a cell.
    #[must_use]
    pub const fn col_row(&self, grid: GridNo) -> (i32, i32) {
        ((grid.0 % self.cols) as i32, (grid.0 / self.cols) as i32)
    }

    /// World-space center of a cell.
    #[must_use]
    pub fn center(&self, grid: GridNo) -> Vec2 {
        let (col, row) = self.col_row(grid);
        let half = self.cell_size / 2.0;
        Vec2::new(
            col as f32 * self.cell_size + half,
            row as f32 * self.cell_size + half,
        )
    }

    /// Cell containing a world-space horizontal position.
    #[must_use]
    pub fn grid_at(&self, x: f32, y: f32) -> Option<GridNo> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / self.cell_size) as i64;
        let row = (y / self.cell_size) as i64;
        if col >= i64::from(self.cols) || row >= i64::from(self.rows) {
            return None;
        }
        self.grid_no(col as i32, row as i32)
    }

    /// Cell under a 3-D position (height is ignored).
    #[must_use]
    pub fn grid_at_position(&self, position: Vec3) -> Option<GridNo> {
        self.grid_at(position.x, position.y)
    }

    /// Straight-line distance between two cell centers in world units.
    #[must_use]
    pub fn range_between(&self, a: GridNo, b: GridNo) -> f32 {
        let (ac, ar) = self.col_row(a);
        let (bc, br) = self.col_row(b);
        let dc = (ac - bc) as f32;
        let dr = (ar - br) as f32;
        dc.hypot(dr) * self.cell_size
    }

    /// Whole cells between two cells along a straight line.
    #[must_use]
    pub fn pyth_spaces(&self, a: GridNo, b: GridNo) -> u32 {
        let (ac, ar) = self.col_row(a);
        let (bc, br) = self.col_row(b);
        let dc = f64::from(ac - bc);
        let dr = f64::from(ar - br);
        dc.hypot(dr) as u32
    }

    /// Cell displaced by a column/row offset, if still on the map.
    #[must_use]
    pub fn offset(&self, grid: GridNo, dcol: i32, drow: i32) -> Option<GridNo> {
        let (col, row) = self.col_row(grid);
        self.grid_no(col + dcol, row + drow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_empty_map() {
        assert!(GridGeometry::new(0, 10, 10.0).is_err());
        assert!(GridGeometry::new(10, 10, 0.0).is_err());
        assert!(GridGeometry::new(10, 12, 10.0).is_ok());
    }

    #[test]
    fn test_negative_positions_are_off_map() {
        let grid = GridGeometry::STANDARD;
        assert_eq!(grid.grid_at(-0.5, 5.0), None);
        assert_eq!(grid.grid_at(5.0, 1600.0), None);
        assert_eq!(grid.grid_at(0.0, 0.0), grid.grid_no(0, 0));
    }

    #[test]
    fn test_range_and_spaces() {
        let grid = GridGeometry::STANDARD;
        let a = grid.grid_no(10, 10).expect("a");
        let b = grid.grid_no(13, 14).expect("b");
        assert!((grid.range_between(a, b) - 50.0).abs() < 1e-4);
        assert_eq!(grid.pyth_spaces(a, b), 5);

        let c = grid.grid_no(11, 11).expect("c");
        assert_eq!(grid.pyth_spaces(a, c), 1);
    }

    #[test]
    fn test_height_conversions() {
        assert!((pixels_to_height_units(50.0) - 256.0).abs() < 1e-4);
        assert!((height_units_to_pixels(256.0) - 50.0).abs() < 1e-4);
        assert_eq!(object_level(0.0), 0);
        assert_eq!(object_level(250.0), 1);
        assert_eq!(object_level(-40.0), 0);
    }

    proptest! {
        #[test]
        fn prop_center_maps_back(col in 0i32..160, row in 0i32..160) {
            let grid = GridGeometry::STANDARD;
            let cell = grid.grid_no(col, row).expect("in bounds");
            let center = grid.center(cell);
            prop_assert_eq!(grid.grid_at(center.x, center.y), Some(cell));
            prop_assert_eq!(grid.col_row(cell), (col, row));
        }
    }
}
