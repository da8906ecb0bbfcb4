//! Grid addressing errors.

use thiserror::Error;

/// Grid addressing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Map dimensions are unusable
    #[error("Invalid grid dimensions {cols}x{rows}")]
    InvalidDimensions {
        /// Columns requested
        cols: u32,
        /// Rows requested
        rows: u32,
    },

    /// Column/row pair lies outside the map
    #[error("Cell ({col}, {row}) is outside the map")]
    OutOfBounds {
        /// Column
        col: i32,
        /// Row
        row: i32,
    },
}
