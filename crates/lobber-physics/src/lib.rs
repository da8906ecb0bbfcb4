//! # Lobber Physics
//!
//! Projectile physics for tile-based tactical maps.
//!
//! This crate provides:
//! - A fixed-capacity object pool with generation-checked handles
//! - Sub-stepped integration under gravity and friction
//! - Surface-classified collision response with stuck and runaway guards
//! - The per-tick object lifecycle (landing, detonation, catching, water)
//! - Probe-based force and angle searches
//! - Launch parameters for hand throws, mortars and grenade launchers
//! - Snapshot save/restore of the object table
//! - Collaborator traits for the map, actors, items, rendering and audio,
//!   plus an in-memory sandbox implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clock;
pub mod collision;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod integrator;
pub mod item;
pub mod launch;
pub mod lifecycle;
pub mod math;
pub mod object;
pub mod pool;
pub mod sandbox;
pub mod save;
pub mod solver;
pub mod world;

#[cfg(test)]
mod scenario_tests;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::host::*;
    pub use crate::item::*;
    pub use crate::launch::*;
    pub use crate::lifecycle::*;
    pub use crate::object::*;
    pub use crate::pool::*;
    pub use crate::save::*;
    pub use crate::solver::*;
    pub use crate::world::*;
}

pub use prelude::*;
