//! Collision classification and response.
//!
//! A sub-step goes through three phases here:
//!
//! 1. [`detect`] asks the world what the last displacement crossed and
//!    filters the answer for the object's [`SimulationMode`] (probes see a
//!    synthetic ground, objects ignore obstacles in their own launch cell,
//!    the wall/roof probe records obstructions).
//! 2. [`prepare_response`] turns the classification into a bounce normal,
//!    restitution and friction using the [`SurfaceTable`].
//! 3. [`resolve`] applies the bounce, or settles objects that keep hitting
//!    the same spot.
//!
//! Side effects (catching, window breaking, sounds) are not handled here.

use glam::Vec3;
use lobber_common::{ActorId, StructureId};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::{NormalSource, PhysicsConfig, SurfaceClass, SurfaceTable};
use crate::host::WorldGeometry;
use crate::math::{bounce_impulse, reversed_incidence};
use crate::object::{CollisionMemory, PhysicalObject, SimulationMode};

/// Orientation of a wall or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// North-east face
    NorthEast,
    /// North-west face
    NorthWest,
    /// South-east face
    SouthEast,
    /// South-west face
    SouthWest,
}

/// What a displacement ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Land surface
    Ground,
    /// Water surface
    Water,
    /// Roof, from above
    Roof,
    /// Roof, from inside the building
    InteriorRoof,
    /// Top of a structure or actor
    StructureZ,
    /// Wall
    Wall(Facing),
    /// Window pane
    Window(Facing),
    /// Actor body
    Actor,
    /// Side of a structure
    Structure,
}

impl CollisionKind {
    /// Surface family used for the response, `None` for windows (which are
    /// flown through).
    #[must_use]
    pub const fn surface(self) -> Option<SurfaceClass> {
        match self {
            Self::Ground => Some(SurfaceClass::Ground),
            Self::Water => Some(SurfaceClass::Water),
            Self::Roof | Self::InteriorRoof => Some(SurfaceClass::Roof),
            Self::StructureZ => Some(SurfaceClass::StructureTop),
            Self::Wall(_) => Some(SurfaceClass::Wall),
            Self::Actor | Self::Structure => Some(SurfaceClass::Obstacle),
            Self::Window(_) => None,
        }
    }

    /// Terrain and building shell, never confused with the thrower's own
    /// surroundings.
    #[must_use]
    pub const fn is_shell(self) -> bool {
        matches!(
            self,
            Self::Ground | Self::Water | Self::Roof | Self::InteriorRoof | Self::Wall(_)
        )
    }

    /// Actors and structures an object passes while it is still close to
    /// where it was launched.
    #[must_use]
    pub const fn is_near_obstacle(self) -> bool {
        matches!(self, Self::Actor | Self::Structure | Self::StructureZ)
    }

    /// Surfaces an object can come to rest on.
    #[must_use]
    pub const fn supports(self) -> bool {
        matches!(self, Self::Ground | Self::Roof | Self::StructureZ)
    }
}

/// The thing behind a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Obstacle {
    /// Terrain or nothing in particular
    #[default]
    None,
    /// An actor
    Actor(ActorId),
    /// A static structure
    Structure(StructureId),
}

impl Obstacle {
    /// Actor behind the collision, if any.
    #[must_use]
    pub const fn actor(self) -> Option<ActorId> {
        match self {
            Self::Actor(id) => Some(id),
            _ => None,
        }
    }
}

/// Answer of a world collision query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionHit {
    /// Classification
    pub kind: CollisionKind,
    /// Actor or structure involved
    pub obstacle: Obstacle,
    /// Surface normal reported by the world
    pub normal: Vec3,
}

impl CollisionHit {
    /// A hit with no obstacle and no reported normal.
    #[must_use]
    pub const fn new(kind: CollisionKind) -> Self {
        Self {
            kind,
            obstacle: Obstacle::None,
            normal: Vec3::ZERO,
        }
    }

    /// Sets the obstacle.
    #[must_use]
    pub const fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacle = obstacle;
        self
    }

    /// Sets the reported normal.
    #[must_use]
    pub const fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

/// Result of resolving a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Rewound and bounced; the sub-step loop stops for this tick
    Rebounded,
    /// Stuck in place: horizontal motion removed, sub-stepping continues
    Settled,
    /// Too many identical collisions; the object is dead
    Runaway,
}

/// Classifies the last displacement for the object's mode.
pub fn detect(
    object: &mut PhysicalObject,
    world: &dyn WorldGeometry,
    config: &PhysicsConfig,
) -> Option<CollisionHit> {
    let delta = object.displacement();

    let mut hit = match object.mode {
        SimulationMode::ProbeUnrestricted => crossed_target_height(object, delta, config),
        SimulationMode::Live | SimulationMode::ProbeIgnoreWallsRoofs => {
            world.check_collision(object.position, delta)
        },
    };

    if let Some(found) = hit {
        if !found.kind.is_shell() {
            if object.first_move_pending || object.first_grid == object.grid {
                hit = None;
            } else if object.tiles_moved < config.min_tiles_before_obstacle
                && found.kind.is_near_obstacle()
            {
                hit = None;
            }
        }
    }

    if object.mode == SimulationMode::ProbeIgnoreWallsRoofs {
        hit = record_obstruction(object, hit);
    }

    hit
}

/// Synthetic ground used by unrestricted probes: reports a ground hit once
/// the object descends through its target height.
fn crossed_target_height(
    object: &mut PhysicalObject,
    delta: Vec3,
    config: &PhysicsConfig,
) -> Option<CollisionHit> {
    let probe = &mut object.probe;
    if object.position.z >= probe.z_target || delta.z >= 0.0 {
        return None;
    }
    if probe.target_pending && probe.z_target > config.probe_z_target_threshold {
        // Elevated target reached: freeze the measurement, keep falling to
        // the ground.
        probe.target_pending = false;
        probe.z_target = 0.0;
        return None;
    }
    Some(CollisionHit::new(CollisionKind::Ground))
}

fn record_obstruction(
    object: &mut PhysicalObject,
    hit: Option<CollisionHit>,
) -> Option<CollisionHit> {
    let found = hit?;
    let position = object.position;
    let probe = &mut object.probe;
    match found.kind {
        CollisionKind::Structure | CollisionKind::StructureZ => {
            probe.collision_position.get_or_insert(position);
            if found.obstacle.actor().is_none() {
                probe.ended_with_collision = true;
                return None;
            }
        },
        CollisionKind::Roof => {
            probe.collision_position.get_or_insert(position);
        },
        CollisionKind::Wall(_) => probe.ended_with_collision = true,
        CollisionKind::Ground
        | CollisionKind::Water
        | CollisionKind::InteriorRoof
        | CollisionKind::Window(_)
        | CollisionKind::Actor => {},
    }
    Some(found)
}

/// Updates the same-classification counter.
pub fn count_repeat(memory: &mut CollisionMemory, kind: CollisionKind) {
    if memory.last == Some(kind) {
        memory.consecutive = memory.consecutive.saturating_add(1);
    } else {
        memory.consecutive = 1;
    }
}

/// Records normal, restitution and friction for a hit.
///
/// Returns false if the surface produces no bounce (water); the collision
/// counters are then reset.
pub fn prepare_response(object: &mut PhysicalObject, hit: &CollisionHit, table: &SurfaceTable) -> bool {
    let Some(class) = hit.kind.surface() else {
        return false;
    };
    let response = table.response(class);

    if let Some(mu) = response.friction {
        object.apply_friction = true;
        object.friction = mu;
    }

    let normal = match response.normal {
        NormalSource::Vertical => Vec3::NEG_Z,
        NormalSource::Reported => hit.normal,
        NormalSource::ReversedIncidence => reversed_incidence(object.displacement()),
        NormalSource::None => {
            let memory = &mut object.collision;
            memory.consecutive = 0;
            memory.consecutive_still = 0;
            object.hit_ground_once = false;
            return false;
        },
    };

    let memory = &mut object.collision;
    memory.normal = normal;
    memory.restitution = response.restitution;
    memory.last = Some(hit.kind);
    memory.velocity = object.old_velocity;
    true
}

/// Bounces the object, or settles it if it keeps colliding in place.
pub fn resolve(object: &mut PhysicalObject, kind: CollisionKind, config: &PhysicsConfig) -> Resolution {
    let delta = object.displacement();
    let epsilon = config.stuck_displacement;

    if delta.x.abs() <= epsilon && delta.y.abs() <= epsilon {
        object.collision.consecutive_still = object.collision.consecutive_still.saturating_add(1);
    } else {
        object.collision.consecutive_still = 0;
    }

    let resolution = if object.collision.consecutive_still > config.stuck_collision_limit {
        object.velocity.x = 0.0;
        object.velocity.y = 0.0;
        if kind.supports() {
            object.velocity.z = 0.0;
            object.alive = false;
        }
        trace!(?kind, alive = object.alive, "object settled");
        Resolution::Settled
    } else {
        object.position = object.old_position;
        object.old_position = object.position - delta;
        let memory = &object.collision;
        object.velocity += bounce_impulse(memory.velocity, memory.normal, memory.restitution);
        Resolution::Rebounded
    };

    if object.position.z < 0.0 {
        object.position.z = 0.0;
    }

    if object.collision.consecutive > config.runaway_collision_limit {
        warn!(
            ?kind,
            count = object.collision.consecutive,
            "runaway collision loop, removing object"
        );
        object.alive = false;
        return Resolution::Runaway;
    }

    resolution
}
