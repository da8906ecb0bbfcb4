//! Launch parameters for actors.
//!
//! Hand throws search for the force at the class angle and are capped at
//! the actor's strength; armed launchers fire at full strength and search
//! the angle instead. Both re-aim through a window when one lies between
//! a ground-level thrower and the target.

use std::f32::consts::FRAC_PI_4;

use glam::Vec3;
use lobber_common::{ActorId, GridGeometry, GridNo, ItemTypeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::CollisionHit;
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, PhysicsResult};
use crate::host::{ActorInfo, ActorRegistry, Host, RandomSource, WorldGeometry};
use crate::item::{ItemDescription, ItemKind, LauncherKind, ThrownItem};
use crate::math::aim;
use crate::object::ActionCode;
use crate::solver::{clear_path, find_angle, find_force, AngleOutcome, Shot};

/// Rows and columns of the reference map used to turn ranges into forces.
const REFERENCE_SIZE: u32 = 160;
/// Launch cell on the reference map.
const REFERENCE_ORIGIN: (i32, i32) = (88, 27);
/// Longest range, in cells, measured on the reference map.
const REFERENCE_MAX_RANGE: u16 = 100;

/// A launch waiting for the actor's release frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowParameters {
    /// Launch position (height above the land surface)
    pub origin: Vec3,
    /// Launch force in vertical units
    pub force: Vec3,
    /// Maximum life, `None` for unbounded
    pub life_length: Option<f32>,
    /// Arrival behaviour
    pub action: ActionCode,
    /// Intended catcher
    pub target: Option<ActorId>,
    /// Item to launch
    pub item: ThrownItem,
}

/// Force and elevation chosen for a throw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicParams {
    /// Force magnitude
    pub force: f32,
    /// Elevation in radians
    pub angle: f32,
    /// Launch height used by the searches
    pub start_z: f32,
    /// Thrown under a roof or underground
    pub indoors: bool,
    /// Window the throw is aimed through
    pub window: Option<GridNo>,
}

/// Answer of [`calculate_chance_to_get_through`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetThrough {
    /// The throw reaches the target
    pub succeeded: bool,
    /// Where the throw was predicted to end
    pub final_grid: Option<GridNo>,
    /// Building level it was predicted to end on
    pub final_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Hand,
    Mortar,
    GrenadeLauncher,
}

impl Class {
    fn of(item: &ThrownItem, armed: bool) -> Self {
        match (armed, item.launcher_class()) {
            (true, Some(LauncherKind::Mortar)) => Self::Mortar,
            (true, Some(LauncherKind::GrenadeLauncher | LauncherKind::UnderbarrelLauncher)) => {
                Self::GrenadeLauncher
            },
            _ => Self::Hand,
        }
    }
}

/// Picks force and elevation for a throw at a target cell.
pub fn basic_params(
    host: &dyn Host,
    config: &PhysicsConfig,
    actor: &ActorInfo,
    item: &ThrownItem,
    target: GridNo,
    level: u8,
    end_z: f32,
    armed: bool,
) -> BasicParams {
    let world = host.geometry();
    let launch = &config.launch;
    let class = Class::of(item, armed);
    let throw_height = launch.throw_height(actor.level, actor.stance);

    let start_z = match class {
        Class::Mortar => f32::from(actor.level) * launch.level_height,
        Class::Hand | Class::GrenadeLauncher => throw_height,
    };
    let mut angle = match class {
        Class::GrenadeLauncher if level == 1 => launch.launcher_upper_angle,
        Class::GrenadeLauncher => launch.launcher_angle,
        Class::Hand | Class::Mortar => launch.outdoors_angle,
    };

    let indoors = world.is_underground()
        || (actor.level == 0 && world.has_roof(actor.grid))
        || (level == 0 && world.has_roof(target));
    if indoors {
        angle = launch.indoors_angle;
    }

    let window = if level == 0 {
        world.window_between(actor.grid, target)
    } else {
        None
    };
    if let Some(cell) = window {
        debug!(%cell, "aiming through a window");
    }

    let shot = Shot {
        from: actor.grid,
        to: target,
        start_z,
        end_z,
    };
    let max_force = max_force(config, host.max_toss_range(actor.id, item, armed));

    let mut force = if class == Class::Hand {
        let limit = if indoors {
            max_force * launch.indoor_force_multiplier
        } else {
            max_force
        };
        find_force(world, config, item, &shot, angle).force.min(limit)
    } else {
        let min_range = f32::from(launch.min_launcher_range) / 10.0;
        let min_force = force_from_range(config, min_range, FRAC_PI_4);
        let mut force = max_force;
        if level == 0 {
            force *= launch.ground_level_launcher_multiplier;
        }
        let force = force.max(min_force);

        if let Some(found) = find_angle(world, config, item, &shot, force, angle).outcome.angle() {
            angle = found;
        }
        force
    };

    if class != Class::Hand && level == 1 && window.is_none() && host.actor_at(target, 1).is_some() {
        let retry_force = force * launch.occupied_retry_multiplier;
        let retry = Shot {
            start_z: throw_height,
            end_z: launch.window_target_height,
            ..shot
        };
        if let Some(found) = find_angle(world, config, item, &retry, retry_force, angle).outcome.angle() {
            debug!(angle = found, "upper-level target occupied, throwing short");
            angle = found;
            force = retry_force;
        }
    }

    if let Some(cell) = window {
        let through = Shot {
            from: actor.grid,
            to: cell,
            start_z: throw_height,
            end_z: launch.window_target_height,
        };
        angle = find_angle(world, config, item, &through, force, config.angle_search_start)
            .outcome
            .angle_or_flat();
    }

    BasicParams {
        force,
        angle,
        start_z,
        indoors,
        window,
    }
}

/// Predicts whether a throw would reach its target unobstructed.
///
/// Throwing at the actor's own cell succeeds without simulating anything.
pub fn calculate_chance_to_get_through(
    host: &dyn Host,
    config: &PhysicsConfig,
    actor: ActorId,
    item: &ThrownItem,
    target: GridNo,
    level: u8,
    end_z: f32,
    armed: bool,
    from_ui: bool,
) -> PhysicsResult<GetThrough> {
    let info = host.actor(actor).ok_or(PhysicsError::UnknownActor(actor))?;
    if info.grid == target {
        return Ok(GetThrough {
            succeeded: true,
            final_grid: Some(target),
            final_level: info.level,
        });
    }

    let params = basic_params(host, config, &info, item, target, level, end_z, armed);
    let shot = Shot {
        from: info.grid,
        to: target,
        start_z: config.launch.throw_height(info.level, info.stance),
        end_z,
    };
    let path = clear_path(
        host.geometry(),
        config,
        item,
        &shot,
        params.angle,
        params.force,
        from_ui,
    );

    let succeeded = path.clear
        && path.final_level == level
        && (from_ui || path.final_grid == Some(target));
    debug!(%actor, %target, succeeded, "chance to get through");
    Ok(GetThrough {
        succeeded,
        final_grid: path.final_grid,
        final_level: path.final_level,
    })
}

/// Computes a throw, applies dispersion and queues it on the actor.
pub fn calculate_params_for_throw(
    host: &mut dyn Host,
    config: &PhysicsConfig,
    actor: ActorId,
    target: GridNo,
    level: u8,
    end_z: f32,
    item: &ThrownItem,
    miss_by: i8,
    action: ActionCode,
    catcher: Option<ActorId>,
) -> PhysicsResult<ThrowParameters> {
    let info = host.actor(actor).ok_or(PhysicsError::UnknownActor(actor))?;
    let aimed_at = host.actor_at(target, level);
    host.set_attack_target(actor, aimed_at);

    let launch = &config.launch;
    let geometry = host.geometry().grid();
    let mut landing = target;
    if miss_by > 0 {
        let miss_by = miss_by.clamp(launch.min_miss_by, launch.max_miss_by);
        let spaces = geometry.pyth_spaces(target, info.grid);
        let radius = if spaces < 3 {
            spaces as f32 / 2.0
        } else {
            f32::from(launch.max_miss_radius)
        };
        let scale = f32::from(miss_by) / f32::from(launch.max_miss_by);
        let max_radius = ((radius * scale) as i32).clamp(2, 4);
        let min_radius = (max_radius - 1).max(2);
        landing = random_grid_from_radius(&geometry, host.rng(), target, min_radius, max_radius);
        debug!(miss_by, %target, %landing, "throw dispersed");
    }

    let armed = action == ActionCode::ArmedThrow;
    let params = basic_params(host, config, &info, item, landing, level, end_z, armed);

    let from = geometry.center(info.grid);
    let to = geometry.center(landing);
    let force = aim(from, to, params.angle, params.force);
    let start_z = if armed && item.launcher_class() == Some(LauncherKind::Mortar) {
        f32::from(info.level) * launch.level_height + launch.mortar_start_offset
    } else {
        launch.throw_height(info.level, info.stance)
    };

    let throw = ThrowParameters {
        origin: from.extend(start_z),
        force,
        life_length: None,
        action,
        target: catcher,
        item: item.clone(),
    };
    host.queue_throw(actor, throw.clone());
    Ok(throw)
}

/// Random cell in the square ring `[min, max]` cells away diagonally.
///
/// Only cells off both axes are candidates; the target itself is returned
/// if none of them is on the map.
fn random_grid_from_radius(
    geometry: &GridGeometry,
    rng: &mut dyn RandomSource,
    center: GridNo,
    min_radius: i32,
    max_radius: i32,
) -> GridNo {
    let mut candidates = Vec::new();
    for dx in min_radius..=max_radius {
        for dy in min_radius..=max_radius {
            for (sx, sy) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
                if let Some(cell) = geometry.offset(center, sx * dx, sy * dy) {
                    candidates.push(cell);
                }
            }
        }
    }
    if candidates.is_empty() {
        return center;
    }
    candidates[rng.below(candidates.len() as u32) as usize]
}

/// Force that reaches the actor's maximum toss range at 45 degrees.
fn max_force(config: &PhysicsConfig, range_cells: u16) -> f32 {
    force_from_range(config, f32::from(range_cells), FRAC_PI_4)
}

/// Force that carries a hand grenade a number of cells over flat ground.
///
/// Every item is calibrated against the same grenade so that strength
/// limits do not depend on what is being thrown.
pub fn force_from_range(config: &PhysicsConfig, range_cells: f32, angle: f32) -> f32 {
    let reference = FlatReference::new();
    match reference.shot(config, range_cells) {
        Some(shot) => find_force(&reference, config, &calibration_grenade(), &shot, angle).force,
        None => 0.0,
    }
}

fn calibration_grenade() -> ThrownItem {
    let description = ItemDescription {
        id: ItemTypeId::new(0),
        name: "calibration grenade".to_string(),
        kind: ItemKind::Grenade,
        sinks: true,
        thrown: true,
        tile: 0,
        fired_by: None,
    };
    ThrownItem::new(description, 100)
}

/// Empty, flat map used to calibrate forces against ranges.
struct FlatReference {
    geometry: GridGeometry,
}

impl FlatReference {
    fn new() -> Self {
        let geometry = GridGeometry::new(REFERENCE_SIZE, REFERENCE_SIZE, GridGeometry::STANDARD.cell_size)
            .unwrap_or(GridGeometry::STANDARD);
        Self { geometry }
    }

    /// Straight shot along the rows from the reference origin.
    fn shot(&self, config: &PhysicsConfig, range_cells: f32) -> Option<Shot> {
        let (col, row) = REFERENCE_ORIGIN;
        let rows = range_cells.clamp(0.0, f32::from(REFERENCE_MAX_RANGE)) as i32;
        Some(Shot {
            from: self.geometry.grid_no(col, row)?,
            to: self.geometry.grid_no(col, row + rows)?,
            start_z: config.launch.standing_height,
            end_z: 0.0,
        })
    }
}

impl WorldGeometry for FlatReference {
    fn grid(&self) -> GridGeometry {
        self.geometry
    }

    fn check_collision(&self, _position: Vec3, _delta: Vec3) -> Option<CollisionHit> {
        None
    }

    fn land_height(&self, _grid: GridNo) -> f32 {
        0.0
    }

    fn is_visible_tile(&self, grid: GridNo) -> bool {
        self.geometry.contains(grid)
    }

    fn has_roof(&self, _grid: GridNo) -> bool {
        false
    }

    fn is_underground(&self) -> bool {
        false
    }

    fn window_between(&self, _from: GridNo, _to: GridNo) -> Option<GridNo> {
        None
    }
}
