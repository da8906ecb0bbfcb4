//! Trajectory probes and the launch searches built on them.
//!
//! A probe is an invisible object flown to completion on a stack-local
//! record through the ordinary lifecycle step, with nothing but read-only
//! geometry to talk to. The searches are bounded proportional corrections:
//!
//! * [`find_force`] keeps the angle and scales the force by half the
//!   relative range error until the error drops under `force_tolerance`.
//! * [`find_angle`] keeps the force and scales the angle the same way
//!   until the error drops under `angle_tolerance`, falling back to a flat
//!   shot once the angle leaves `(min_search_angle, pi/2)`.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use lobber_common::{object_level, GridNo};
use tracing::{debug, warn};

use crate::config::PhysicsConfig;
use crate::host::WorldGeometry;
use crate::item::ThrownItem;
use crate::lifecycle::{step, Simulation, StepOutcome};
use crate::math::{aim, planar_distance};
use crate::object::{PhysicalObject, SimulationMode};

/// What a probe is measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    /// Range at the target height, flying through everything
    Range,
    /// Whether anything solid is in the way
    ClearPath,
}

impl ProbeMode {
    const fn simulation_mode(self) -> SimulationMode {
        match self {
            Self::Range => SimulationMode::ProbeUnrestricted,
            Self::ClearPath => SimulationMode::ProbeIgnoreWallsRoofs,
        }
    }
}

/// A candidate launch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSpec {
    /// Item to fly
    pub item: ThrownItem,
    /// Launch position (height above the land surface)
    pub origin: Vec3,
    /// Launch force in vertical units
    pub force: Vec3,
    /// Height at which the range is measured
    pub end_z: f32,
    /// Measurement
    pub mode: ProbeMode,
}

/// Measurements read back from a finished probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    /// Planar distance from the origin to the measured point
    pub range: f32,
    /// Where the probe came to rest
    pub final_position: Vec3,
    /// Cell it came to rest in
    pub final_grid: Option<GridNo>,
    /// A disqualifying obstruction was hit
    pub ended_with_collision: bool,
    /// First obstruction met, or the resting position if there was none
    pub collision_position: Vec3,
    /// Ticks simulated
    pub ticks: u32,
}

/// Flies a probe until it dies.
///
/// Life is capped at `probe_max_ticks` ticks so a probe always finishes.
#[must_use]
pub fn run_to_completion(
    spec: &ProbeSpec,
    world: &dyn WorldGeometry,
    config: &PhysicsConfig,
) -> ProbeOutcome {
    let mut object = PhysicalObject::probe(
        spec.item.clone(),
        spec.origin,
        spec.force,
        spec.end_z,
        spec.mode.simulation_mode(),
        world,
        config,
    );
    object.life_length = Some(config.probe_max_ticks as f32 * config.tick_duration);

    let mut sim = Simulation::Probe(world);
    let mut ticks = 0;
    while ticks <= config.probe_max_ticks {
        ticks += 1;
        if let StepOutcome::Finished(_) = step(&mut object, &mut sim, config) {
            break;
        }
    }

    ProbeOutcome {
        range: planar_distance(object.probe.target_position, spec.origin),
        final_position: object.position,
        final_grid: world.grid().grid_at_position(object.position),
        ended_with_collision: object.probe.ended_with_collision,
        collision_position: object.probe.collision_position.unwrap_or(object.position),
        ticks,
    }
}

/// A shot between two cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    /// Launch cell
    pub from: GridNo,
    /// Target cell
    pub to: GridNo,
    /// Launch height
    pub start_z: f32,
    /// Height at which the range is measured
    pub end_z: f32,
}

impl Shot {
    /// Probe for this shot at a given elevation and force.
    fn probe(&self, world: &dyn WorldGeometry, item: &ThrownItem, angle: f32, force: f32, mode: ProbeMode) -> ProbeSpec {
        let geometry = world.grid();
        let from = geometry.center(self.from);
        let to = geometry.center(self.to);
        ProbeSpec {
            item: item.clone(),
            origin: from.extend(self.start_z),
            force: aim(from, to, angle, force),
            end_z: self.end_z,
            mode,
        }
    }

    fn range(&self, world: &dyn WorldGeometry) -> f32 {
        world.grid().range_between(self.from, self.to)
    }
}

/// Result of a force search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceSearch {
    /// Force magnitude found (or the last one tried)
    pub force: f32,
    /// Probes flown
    pub probes: u32,
    /// Relative range error of the last probe
    pub error: f32,
    /// The error is within tolerance
    pub converged: bool,
    /// Cell the last probe ended in
    pub final_grid: Option<GridNo>,
}

/// Finds the force that carries an item over the shot at a fixed angle.
#[must_use]
pub fn find_force(
    world: &dyn WorldGeometry,
    config: &PhysicsConfig,
    item: &ThrownItem,
    shot: &Shot,
    angle: f32,
) -> ForceSearch {
    let range = shot.range(world);
    if range <= 0.0 {
        return ForceSearch {
            force: 0.0,
            probes: 0,
            error: 0.0,
            converged: true,
            final_grid: Some(shot.to),
        };
    }

    let spread = (2.0 * angle).sin().max(1e-3);
    let mut force = config.range_force_factor * (config.gravity * range / spread).sqrt();
    let mut search = ForceSearch {
        force,
        probes: 0,
        error: f32::INFINITY,
        converged: false,
        final_grid: None,
    };

    for probe in 1..=config.max_search_probes {
        let outcome = run_to_completion(
            &shot.probe(world, item, angle, force, ProbeMode::Range),
            world,
            config,
        );
        let error = (outcome.range - range) / range;
        search = ForceSearch {
            force,
            probes: probe,
            error,
            converged: error.abs() < config.force_tolerance,
            final_grid: outcome.final_grid,
        };
        if search.converged || probe == config.max_search_probes {
            break;
        }
        force -= force * error / 2.0;
    }

    if search.converged {
        debug!(force = search.force, probes = search.probes, error = search.error, "force search converged");
    } else {
        warn!(force = search.force, error = search.error, "force search did not converge");
    }
    search
}

/// How an angle search ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleOutcome {
    /// Within tolerance
    Converged(f32),
    /// Out of probes; the last angle tried
    BestEffort(f32),
    /// The angle left the usable range
    NoSolution,
}

impl AngleOutcome {
    /// The angle found, with a failed search mapped to a flat shot.
    #[must_use]
    pub const fn angle_or_flat(self) -> f32 {
        match self {
            Self::Converged(angle) | Self::BestEffort(angle) => angle,
            Self::NoSolution => 0.0,
        }
    }

    /// The angle found, if any.
    #[must_use]
    pub const fn angle(self) -> Option<f32> {
        match self {
            Self::Converged(angle) | Self::BestEffort(angle) => Some(angle),
            Self::NoSolution => None,
        }
    }
}

/// Result of an angle search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSearch {
    /// How the search ended
    pub outcome: AngleOutcome,
    /// Probes flown
    pub probes: u32,
    /// Cell the last probe ended in
    pub final_grid: Option<GridNo>,
}

/// Finds the elevation that carries an item over the shot at a fixed force.
#[must_use]
pub fn find_angle(
    world: &dyn WorldGeometry,
    config: &PhysicsConfig,
    item: &ThrownItem,
    shot: &Shot,
    force: f32,
    start_angle: f32,
) -> AngleSearch {
    let range = shot.range(world);
    if range <= 0.0 {
        return AngleSearch {
            outcome: AngleOutcome::Converged(start_angle),
            probes: 0,
            final_grid: Some(shot.to),
        };
    }

    let mut angle = start_angle;
    for probe in 1..=config.max_search_probes {
        let outcome = run_to_completion(
            &shot.probe(world, item, angle, force, ProbeMode::Range),
            world,
            config,
        );
        let error = (outcome.range - range) / range;

        if error.abs() < config.angle_tolerance {
            debug!(angle, probes = probe, error, "angle search converged");
            return AngleSearch {
                outcome: AngleOutcome::Converged(angle),
                probes: probe,
                final_grid: outcome.final_grid,
            };
        }
        if probe == config.max_search_probes {
            warn!(angle, error, "angle search did not converge");
            return AngleSearch {
                outcome: AngleOutcome::BestEffort(angle),
                probes: probe,
                final_grid: outcome.final_grid,
            };
        }

        angle -= angle * error / 2.0;
        if angle.abs() >= FRAC_PI_2 || angle.abs() <= config.min_search_angle {
            let flat = run_to_completion(
                &shot.probe(world, item, 0.0, force, ProbeMode::Range),
                world,
                config,
            );
            warn!(force, "no usable angle, falling back to a flat shot");
            return AngleSearch {
                outcome: AngleOutcome::NoSolution,
                probes: probe + 1,
                final_grid: flat.final_grid,
            };
        }
    }

    // max_search_probes is at least one, so the loop always returns.
    AngleSearch {
        outcome: AngleOutcome::BestEffort(angle),
        probes: config.max_search_probes,
        final_grid: None,
    }
}

/// Where a clear-path probe ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCheck {
    /// Nothing solid was in the way
    pub clear: bool,
    /// Cell the probe ended in (or the obstruction cell, see
    /// [`clear_path`])
    pub final_grid: Option<GridNo>,
    /// Building level of the end point
    pub final_level: u8,
}

/// Flies a clear-path probe for the shot.
///
/// With `exact_end` the final cell is where the probe came to rest;
/// otherwise it is the cell of the first obstruction met.
#[must_use]
pub fn clear_path(
    world: &dyn WorldGeometry,
    config: &PhysicsConfig,
    item: &ThrownItem,
    shot: &Shot,
    angle: f32,
    force: f32,
    exact_end: bool,
) -> PathCheck {
    let outcome = run_to_completion(
        &shot.probe(world, item, angle, force, ProbeMode::ClearPath),
        world,
        config,
    );
    let geometry = world.grid();
    let resting_grid = geometry.grid_at_position(outcome.final_position);
    let final_grid = if exact_end {
        resting_grid
    } else {
        geometry.grid_at_position(outcome.collision_position)
    };
    let land = final_grid.map_or(0.0, |grid| world.land_height(grid));

    PathCheck {
        clear: !outcome.ended_with_collision,
        final_grid,
        final_level: object_level(outcome.collision_position.z - land),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::sandbox::{sample_item, SandboxWorld};
    use lobber_common::{GridGeometry, HEIGHT_UNITS};

    fn shot(cells: i32) -> Shot {
        let grid = GridGeometry::STANDARD;
        Shot {
            from: grid.grid_no(80, 80).expect("cell"),
            to: grid.grid_no(80 + cells, 80).expect("cell"),
            start_z: 191.0,
            end_z: 0.0,
        }
    }

    #[test]
    fn test_probe_finishes_and_measures() {
        let world = SandboxWorld::new(GridGeometry::STANDARD);
        let config = PhysicsConfig::default();
        let spec = shot(10).probe(&world, &sample_item(ItemKind::Grenade), 0.6, 600.0, ProbeMode::Range);
        let outcome = run_to_completion(&spec, &world, &config);
        assert!(outcome.range > 0.0);
        assert!(outcome.ticks < config.probe_max_ticks);
        assert!(!outcome.ended_with_collision);
    }

    #[test]
    fn test_force_search_converges() {
        let world = SandboxWorld::new(GridGeometry::STANDARD);
        let config = PhysicsConfig::default();
        let item = sample_item(ItemKind::Grenade);
        for cells in [2, 3, 5, 8, 10, 15, 20, 25] {
            let search = find_force(&world, &config, &item, &shot(cells), std::f32::consts::FRAC_PI_4);
            assert!(search.converged, "{cells} cells: {search:?}");
            assert!(search.probes <= 8);
            assert!(search.error.abs() <= 0.01);
        }
    }

    #[test]
    fn test_zero_range_needs_no_probe() {
        let world = SandboxWorld::new(GridGeometry::STANDARD);
        let config = PhysicsConfig::default();
        let search = find_force(&world, &config, &sample_item(ItemKind::Rock), &shot(0), 0.7);
        assert_eq!(search.probes, 0);
        assert_eq!(search.force, 0.0);
        assert_eq!(world.query_count(), 0);
    }

    #[test]
    fn test_angle_search_solves_reachable_range() {
        let world = SandboxWorld::new(GridGeometry::STANDARD);
        let config = PhysicsConfig::default();
        let item = sample_item(ItemKind::Grenade);

        let search = find_angle(&world, &config, &item, &shot(9), 1000.0, config.angle_search_start);
        assert!(matches!(search.outcome, AngleOutcome::Converged(_)), "{search:?}");

        let search = find_angle(&world, &config, &item, &shot(8), 900.0, config.angle_search_start);
        let angle = search.outcome.angle().expect("solution");
        assert!(angle > 0.0 && angle < FRAC_PI_2);
    }

    #[test]
    fn test_angle_search_falls_back_to_flat() {
        let world = SandboxWorld::new(GridGeometry::STANDARD);
        let config = PhysicsConfig::default();
        let search = find_angle(
            &world,
            &config,
            &sample_item(ItemKind::Grenade),
            &shot(10),
            500.0,
            config.angle_search_start,
        );
        assert_eq!(search.outcome, AngleOutcome::NoSolution);
        assert_eq!(search.outcome.angle_or_flat(), 0.0);
        assert!(search.probes <= 9);
    }

    #[test]
    fn test_clear_path_reports_obstruction() {
        let grid = GridGeometry::STANDARD;
        let mut world = SandboxWorld::new(grid);
        for row in 70..=90 {
            let cell = grid.grid_no(86, row).expect("cell");
            world.set_structure(cell, lobber_common::StructureId::new(9), 5000.0);
        }
        let config = PhysicsConfig::default();
        let item = sample_item(ItemKind::Grenade);
        let target = shot(10);

        let search = find_force(&SandboxWorld::new(grid), &config, &item, &target, 0.3);
        let blocked = clear_path(&world, &config, &item, &target, 0.3, search.force, true);
        assert!(!blocked.clear);

        let open = clear_path(&SandboxWorld::new(grid), &config, &item, &target, 0.3, search.force, true);
        assert!(open.clear);
        assert_eq!(open.final_level, 0);
    }

    #[test]
    fn test_obstruction_level_uses_its_own_land() {
        let grid = GridGeometry::STANDARD;
        let mut world = SandboxWorld::new(grid);
        for row in 70..=90 {
            let cell = grid.grid_no(86, row).expect("cell");
            world.set_land_height(cell, HEIGHT_UNITS);
            world.set_structure(cell, lobber_common::StructureId::new(9), 5000.0);
        }
        let config = PhysicsConfig::default();
        let item = sample_item(ItemKind::Grenade);
        let target = Shot {
            start_z: 600.0,
            ..shot(10)
        };
        let force = find_force(&SandboxWorld::new(grid), &config, &item, &target, 0.3).force;

        let check = clear_path(&world, &config, &item, &target, 0.3, force, false);
        assert!(!check.clear);
        let obstruction = check.final_grid.expect("obstruction cell");
        assert_eq!(grid.col_row(obstruction).0, 86);

        let outcome = run_to_completion(
            &target.probe(&world, &item, 0.3, force, ProbeMode::ClearPath),
            &world,
            &config,
        );
        assert_eq!(
            check.final_level,
            object_level(outcome.collision_position.z - HEIGHT_UNITS)
        );
    }
}
