//! # Lobber Common
//!
//! Common types shared by the Lobber physics core and its drivers.
//!
//! This crate provides:
//! - Grid/cell coordinates and height-unit conversions
//! - ID types for actors, items and structures
//! - Version information for persisted snapshots
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
