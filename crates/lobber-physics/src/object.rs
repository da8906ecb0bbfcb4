//! Physical object records.

use glam::Vec3;
use lobber_common::{ActorId, GridNo};
use serde::{Deserialize, Serialize};

use crate::collision::CollisionKind;
use crate::config::PhysicsConfig;
use crate::host::{SoundHandle, VisualHandle, WorldGeometry};
use crate::item::ThrownItem;
use crate::math::scale_launch_force;

/// What the object should do when it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCode {
    /// No special handling (probe objects)
    None,
    /// Plain toss; the item is dropped where it lands
    FreeFall,
    /// Armed explosive or flare
    ArmedThrow,
    /// Tossed to another actor who may catch it
    ThrownToCatch,
}

/// How an object interacts with the world while it is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationMode {
    /// A real object with side effects
    Live,
    /// Flies through everything; only crossing the target height counts
    ProbeUnrestricted,
    /// Bounces off walls and roofs, records obstructions
    ProbeIgnoreWallsRoofs,
}

impl SimulationMode {
    /// Returns true for both probe modes.
    #[must_use]
    pub const fn is_probe(self) -> bool {
        !matches!(self, Self::Live)
    }
}

/// Collision bookkeeping carried between sub-steps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CollisionMemory {
    /// Consecutive collisions with the same classification
    pub consecutive: u16,
    /// Consecutive collisions with almost no horizontal displacement
    pub consecutive_still: u16,
    /// Classification of the last collision that produced a bounce
    pub last: Option<CollisionKind>,
    /// Velocity just before the last bounce
    pub velocity: Vec3,
    /// Normal of the last bounce
    pub normal: Vec3,
    /// Restitution of the last bounce
    pub restitution: f32,
}

/// Measurements taken by probe simulations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbeRecord {
    /// Height the probe is aiming for
    pub z_target: f32,
    /// Position tracked while the target is still pending
    pub target_position: Vec3,
    /// The target position is still being tracked
    pub target_pending: bool,
    /// A disqualifying obstruction was hit
    pub ended_with_collision: bool,
    /// Where the first relevant obstruction was met
    pub collision_position: Option<Vec3>,
}

/// Progress of a catch by the target actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatchState {
    /// The catcher has been told the object is coming
    pub attempted: bool,
    /// The catch roll has been made
    pub checked: bool,
    /// The catch roll succeeded
    pub good: bool,
    /// The catch animation is playing
    pub animating: bool,
}

/// Sprite and shadow nodes attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedVisual {
    /// Object sprite
    pub node: VisualHandle,
    /// Object shadow
    pub shadow: VisualHandle,
    /// Cell both nodes are attached to
    pub grid: GridNo,
}

/// Everything needed to put a new object into flight.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    /// Carried item
    pub item: ThrownItem,
    /// Maximum life, `None` for unbounded
    pub life_length: Option<f32>,
    /// Start position (height above the land surface)
    pub position: Vec3,
    /// Launch force in vertical units
    pub force: Vec3,
    /// Actor that launched it
    pub owner: Option<ActorId>,
    /// Arrival behaviour
    pub action: ActionCode,
    /// Intended catcher
    pub target: Option<ActorId>,
}

/// One simulated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalObject {
    /// Current position
    pub position: Vec3,
    /// Position before the last sub-step
    pub old_position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Velocity before the last sub-step
    pub old_velocity: Vec3,
    /// Force for the current tick
    pub force: Vec3,
    /// Launch impulse, consumed by the first force computation
    pub initial_force: Vec3,
    /// Time alive
    pub life_span: f32,
    /// Maximum life, `None` for unbounded
    pub life_length: Option<f32>,
    /// Arrival behaviour
    pub action: ActionCode,
    /// Live or probe
    pub mode: SimulationMode,
    /// Still flying
    pub alive: bool,
    /// Drawn by the renderer
    pub visible: bool,
    /// Fell into water
    pub in_water: bool,
    /// Apply friction on the next force computation
    pub apply_friction: bool,
    /// Friction coefficient of the last surface
    pub friction: f32,
    /// Has not completed a full tick yet
    pub first_move_pending: bool,
    /// Hit the ground at least once in the current bounce series
    pub hit_ground_once: bool,
    /// Drop the carried item where the object comes to rest
    pub drop_item: bool,
    /// Catch progress
    pub catch: CatchState,
    /// Collision bookkeeping
    pub collision: CollisionMemory,
    /// Probe measurements
    pub probe: ProbeRecord,
    /// Launching actor
    pub owner: Option<ActorId>,
    /// Intended catcher
    pub target: Option<ActorId>,
    /// Last actor that took damage from this object
    pub last_struck: Option<ActorId>,
    /// Carried item
    pub item: ThrownItem,
    /// Attached sprite and shadow
    pub visual: Option<AttachedVisual>,
    /// Current cell
    pub grid: Option<GridNo>,
    /// Cell after the first full tick
    pub first_grid: Option<GridNo>,
    /// Distinct cells entered
    pub tiles_moved: u32,
    /// Attached sound
    pub sound: Option<SoundHandle>,
}

impl PhysicalObject {
    /// Creates a live object from a launch request.
    ///
    /// The horizontal force components are converted from vertical units to
    /// world units and the whole impulse is scaled by the configured launch
    /// scale. The start height is raised by the land height of the start
    /// cell.
    #[must_use]
    pub fn launch(spec: LaunchSpec, world: &dyn WorldGeometry, config: &PhysicsConfig) -> Self {
        let geometry = world.grid();
        let mut position = spec.position;
        let grid = geometry.grid_at_position(position);
        if let Some(cell) = grid {
            position.z += world.land_height(cell);
        }

        Self {
            position,
            old_position: position,
            velocity: Vec3::ZERO,
            old_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            initial_force: scale_launch_force(
                spec.force,
                geometry.cell_size,
                config.launch_force_scale,
            ),
            life_span: 0.0,
            life_length: spec.life_length,
            action: spec.action,
            mode: SimulationMode::Live,
            alive: true,
            visible: true,
            in_water: false,
            apply_friction: false,
            friction: 0.0,
            first_move_pending: true,
            hit_ground_once: false,
            drop_item: true,
            catch: CatchState::default(),
            collision: CollisionMemory::default(),
            probe: ProbeRecord {
                target_position: position,
                ..ProbeRecord::default()
            },
            owner: spec.owner,
            target: spec.target,
            last_struck: None,
            item: spec.item,
            visual: None,
            grid,
            first_grid: None,
            tiles_moved: 0,
            sound: None,
        }
    }

    /// Creates an invisible probe that measures where a launch ends up.
    #[must_use]
    pub fn probe(
        item: ThrownItem,
        origin: Vec3,
        force: Vec3,
        target_z: f32,
        mode: SimulationMode,
        world: &dyn WorldGeometry,
        config: &PhysicsConfig,
    ) -> Self {
        let spec = LaunchSpec {
            item,
            life_length: None,
            position: origin,
            force,
            owner: None,
            action: ActionCode::None,
            target: None,
        };
        let mut object = Self::launch(spec, world, config);
        object.mode = mode;
        object.visible = false;
        object.probe.z_target = target_z;
        object.probe.target_pending = true;
        object
    }

    /// Returns true for armed throws.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.action == ActionCode::ArmedThrow
    }

    /// Displacement over the last sub-step.
    #[must_use]
    pub fn displacement(&self) -> Vec3 {
        self.position - self.old_position
    }
}
