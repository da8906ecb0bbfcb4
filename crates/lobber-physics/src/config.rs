//! Physics tuning.
//!
//! Every constant the simulation and the launch solver depend on lives
//! here so that a scenario file can override it. Values are validated
//! (clamped) rather than rejected, matching how the rest of the
//! configuration layer behaves.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::host::Stance;

/// Sub-step time scale. Friction coefficients are stored pre-multiplied.
const TIME_SCALE: f32 = 1.8;

/// Surface families that share a collision response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceClass {
    /// Open ground
    Ground,
    /// Roofs, from above or below
    Roof,
    /// Tops of structures and actors
    StructureTop,
    /// Walls
    Wall,
    /// Side of a structure or actor
    Obstacle,
    /// Water
    Water,
}

/// Where the collision normal comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalSource {
    /// Straight up/down
    Vertical,
    /// The normal reported by the world query
    Reported,
    /// Opposite of the horizontal incoming direction
    ReversedIncidence,
    /// No bounce at all
    None,
}

/// Collision response for one surface family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceResponse {
    /// Fraction of normal velocity added back on top of cancelling it
    pub restitution: f32,
    /// One-shot friction applied on the next tick, if any
    pub friction: Option<f32>,
    /// Normal used for the bounce
    pub normal: NormalSource,
}

impl SurfaceResponse {
    const fn new(restitution: f32, friction: Option<f32>, normal: NormalSource) -> Self {
        Self {
            restitution,
            friction,
            normal,
        }
    }
}

/// Response table keyed by [`SurfaceClass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceTable {
    /// Open ground
    pub ground: SurfaceResponse,
    /// Roofs
    pub roof: SurfaceResponse,
    /// Structure and actor tops
    pub structure_top: SurfaceResponse,
    /// Walls
    pub wall: SurfaceResponse,
    /// Structure and actor sides
    pub obstacle: SurfaceResponse,
    /// Water
    pub water: SurfaceResponse,
}

impl Default for SurfaceTable {
    fn default() -> Self {
        Self {
            ground: SurfaceResponse::new(1.3, Some(0.34 * TIME_SCALE), NormalSource::Vertical),
            roof: SurfaceResponse::new(1.4, Some(0.54 * TIME_SCALE), NormalSource::Vertical),
            structure_top: SurfaceResponse::new(
                1.2,
                Some(0.54 * TIME_SCALE),
                NormalSource::Vertical,
            ),
            wall: SurfaceResponse::new(1.1, None, NormalSource::Reported),
            obstacle: SurfaceResponse::new(1.1, None, NormalSource::ReversedIncidence),
            water: SurfaceResponse::new(0.0, Some(1.54 * TIME_SCALE), NormalSource::None),
        }
    }
}

impl SurfaceTable {
    /// Response for a surface family.
    #[must_use]
    pub const fn response(&self, class: SurfaceClass) -> &SurfaceResponse {
        match class {
            SurfaceClass::Ground => &self.ground,
            SurfaceClass::Roof => &self.roof,
            SurfaceClass::StructureTop => &self.structure_top,
            SurfaceClass::Wall => &self.wall,
            SurfaceClass::Obstacle => &self.obstacle,
            SurfaceClass::Water => &self.water,
        }
    }

    fn validate(&mut self) {
        for response in [
            &mut self.ground,
            &mut self.roof,
            &mut self.structure_top,
            &mut self.wall,
            &mut self.obstacle,
            &mut self.water,
        ] {
            response.restitution = response.restitution.clamp(0.0, 2.0);
            response.friction = response.friction.map(|mu| mu.clamp(0.0, 10.0));
        }
    }
}

/// Launch-parameter tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Start angle in the open (radians)
    pub outdoors_angle: f32,
    /// Start angle under a roof or underground (radians)
    pub indoors_angle: f32,
    /// Start angle for grenade launchers (radians)
    pub launcher_angle: f32,
    /// Start angle for grenade launchers aiming at an upper level (radians)
    pub launcher_upper_angle: f32,
    /// Release height when standing, above the floor
    pub standing_height: f32,
    /// Release height when crouched
    pub crouched_height: f32,
    /// Release height when prone
    pub prone_height: f32,
    /// Height units per building level
    pub level_height: f32,
    /// Mortar muzzle height above the floor
    pub mortar_start_offset: f32,
    /// Target height used when aiming through a window
    pub window_target_height: f32,
    /// Minimum launcher range, in tenths of a cell
    pub min_launcher_range: u16,
    /// Max-force multiplier when the throw is indoors
    pub indoor_force_multiplier: f32,
    /// Max-force multiplier for launchers aiming at ground level
    pub ground_level_launcher_multiplier: f32,
    /// Force multiplier for the retry when the upper-level target is occupied
    pub occupied_retry_multiplier: f32,
    /// Largest accepted miss-by value
    pub max_miss_by: i8,
    /// Smallest accepted non-zero miss-by value
    pub min_miss_by: i8,
    /// Default dispersion radius in cells
    pub max_miss_radius: u8,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            outdoors_angle: PI / 4.0,
            indoors_angle: PI / 30.0,
            launcher_angle: PI / 8.0,
            launcher_upper_angle: PI / 6.0,
            standing_height: 191.0,
            crouched_height: 130.0,
            prone_height: 63.0,
            level_height: 256.0,
            mortar_start_offset: 50.0,
            window_target_height: 150.0,
            min_launcher_range: 150,
            indoor_force_multiplier: 2.0,
            ground_level_launcher_multiplier: 1.25,
            occupied_retry_multiplier: 0.85,
            max_miss_by: 30,
            min_miss_by: 1,
            max_miss_radius: 5,
        }
    }
}

impl LaunchConfig {
    /// Release height above the floor for a posture.
    #[must_use]
    pub const fn stance_height(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Standing => self.standing_height,
            Stance::Crouched => self.crouched_height,
            Stance::Prone => self.prone_height,
        }
    }

    /// Absolute release height for an actor on a level.
    #[must_use]
    pub fn throw_height(&self, level: u8, stance: Stance) -> f32 {
        f32::from(level) * self.level_height + self.stance_height(stance)
    }

    fn validate(&mut self) {
        let max_angle = PI / 2.0 - 0.01;
        self.outdoors_angle = self.outdoors_angle.clamp(0.01, max_angle);
        self.indoors_angle = self.indoors_angle.clamp(0.01, max_angle);
        self.launcher_angle = self.launcher_angle.clamp(0.01, max_angle);
        self.launcher_upper_angle = self.launcher_upper_angle.clamp(0.01, max_angle);
        self.level_height = self.level_height.max(1.0);
        self.indoor_force_multiplier = self.indoor_force_multiplier.clamp(0.1, 10.0);
        self.ground_level_launcher_multiplier =
            self.ground_level_launcher_multiplier.clamp(0.1, 10.0);
        self.occupied_retry_multiplier = self.occupied_retry_multiplier.clamp(0.1, 1.0);
        self.min_miss_by = self.min_miss_by.max(1);
        self.max_miss_by = self.max_miss_by.max(self.min_miss_by);
        self.max_miss_radius = self.max_miss_radius.max(1);
    }
}

/// Physics simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // === Integration ===
    /// Downward acceleration
    pub gravity: f32,
    /// Simulated time per tick
    pub tick_duration: f32,
    /// Sub-steps per tick
    pub substeps: u32,
    /// Force time base (forces are expressed per 1/60 of this unit)
    pub force_time_base: f32,
    /// Scale applied to a launch impulse
    pub launch_force_scale: f32,

    // === Pool and clock ===
    /// Number of object slots
    pub pool_capacity: usize,
    /// Milliseconds between physics ticks
    pub update_interval_ms: u32,
    /// Most ticks run for one `update` call
    pub max_catch_up_ticks: u32,

    // === Collision safeguards ===
    /// Horizontal displacement below which a collision counts as stuck
    pub stuck_displacement: f32,
    /// Stuck collisions tolerated before horizontal motion is killed
    pub stuck_collision_limit: u16,
    /// Same-surface collisions tolerated before the object is killed
    pub runaway_collision_limit: u16,
    /// Cells an object must cross before actors and structures stop it
    pub min_tiles_before_obstacle: u32,

    // === Catching and impacts ===
    /// Distance in cells at which the catcher starts the animation
    pub catch_start_spaces: u32,
    /// Distance in cells at which the catch is rolled
    pub catch_attempt_spaces: u32,
    /// Base catch chance in percent (half the dexterity is added)
    pub catch_base_chance: u32,
    /// Item status at or above which a dud roll may succeed
    pub dud_status_threshold: u8,

    // === Trajectory search ===
    /// Probe simulations per search
    pub max_search_probes: u32,
    /// Relative range error accepted by the force search
    pub force_tolerance: f32,
    /// Relative range error accepted by the angle search
    pub angle_tolerance: f32,
    /// Angle search starting angle (radians)
    pub angle_search_start: f32,
    /// Angle below which the angle search gives up (radians)
    pub min_search_angle: f32,
    /// Range-formula multiplier for the first force guess
    pub range_force_factor: f32,
    /// Target height above which probes measure at the crossing point
    pub probe_z_target_threshold: f32,
    /// Hard tick limit for a single probe
    pub probe_max_ticks: u32,

    /// Collision response per surface
    pub surfaces: SurfaceTable,
    /// Launch-parameter tuning
    pub launch: LaunchConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8 * 2.5,
            tick_duration: TIME_SCALE,
            substeps: 10,
            force_time_base: 60.0,
            launch_force_scale: 1.5 / TIME_SCALE,

            pool_capacity: 50,
            update_interval_ms: 10,
            max_catch_up_ticks: 10,

            stuck_displacement: 0.5,
            stuck_collision_limit: 3,
            runaway_collision_limit: 30,
            min_tiles_before_obstacle: 4,

            catch_start_spaces: 4,
            catch_attempt_spaces: 1,
            catch_base_chance: 50,
            dud_status_threshold: 50,

            max_search_probes: 8,
            force_tolerance: 0.01,
            angle_tolerance: 0.05,
            angle_search_start: PI / 8.0,
            min_search_angle: 0.005,
            range_force_factor: 12.0,
            probe_z_target_threshold: 32.0,
            probe_max_ticks: 4000,

            surfaces: SurfaceTable::default(),
            launch: LaunchConfig::default(),
        }
    }
}

impl PhysicsConfig {
    /// Length of one sub-step.
    #[must_use]
    pub fn substep_duration(&self) -> f32 {
        self.tick_duration / self.substeps as f32
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.gravity = self.gravity.clamp(0.0, 1000.0);
        self.tick_duration = self.tick_duration.clamp(0.01, 100.0);
        self.substeps = self.substeps.clamp(1, 100);
        self.force_time_base = self.force_time_base.max(1.0);
        self.launch_force_scale = self.launch_force_scale.clamp(0.01, 100.0);

        self.pool_capacity = self.pool_capacity.clamp(1, usize::from(u16::MAX));
        self.update_interval_ms = self.update_interval_ms.max(1);
        self.max_catch_up_ticks = self.max_catch_up_ticks.max(1);

        self.stuck_displacement = self.stuck_displacement.max(0.0);
        self.runaway_collision_limit = self.runaway_collision_limit.max(1);

        self.catch_base_chance = self.catch_base_chance.min(100);

        self.max_search_probes = self.max_search_probes.clamp(1, 64);
        self.force_tolerance = self.force_tolerance.clamp(0.0001, 0.5);
        self.angle_tolerance = self.angle_tolerance.clamp(0.0001, 0.5);
        self.angle_search_start = self.angle_search_start.clamp(0.01, PI / 2.0 - 0.01);
        self.min_search_angle = self.min_search_angle.clamp(0.0, 0.1);
        self.range_force_factor = self.range_force_factor.max(0.01);
        self.probe_max_ticks = self.probe_max_ticks.clamp(1, 100_000);

        self.surfaces.validate();
        self.launch.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.substeps, 10);
        assert_eq!(config.pool_capacity, 50);
        assert!((config.gravity - 24.5).abs() < 1e-5);
        assert!((config.substep_duration() - 0.18).abs() < 1e-6);
    }

    #[test]
    fn test_surface_table_lookup() {
        let table = SurfaceTable::default();
        let ground = table.response(SurfaceClass::Ground);
        assert!((ground.restitution - 1.3).abs() < 1e-6);
        assert!((ground.friction.unwrap_or_default() - 0.612).abs() < 1e-5);
        assert_eq!(table.response(SurfaceClass::Wall).friction, None);
        assert_eq!(
            table.response(SurfaceClass::Obstacle).normal,
            NormalSource::ReversedIncidence
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = PhysicsConfig::default();
        config.substeps = 0;
        config.pool_capacity = 0;
        config.force_tolerance = 5.0;
        config.launch.occupied_retry_multiplier = 3.0;

        config.validate();

        assert_eq!(config.substeps, 1);
        assert_eq!(config.pool_capacity, 1);
        assert!((config.force_tolerance - 0.5).abs() < 1e-6);
        assert!((config.launch.occupied_retry_multiplier - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stance_heights() {
        let launch = LaunchConfig::default();
        assert!((launch.throw_height(0, Stance::Standing) - 191.0).abs() < 1e-5);
        assert!((launch.throw_height(1, Stance::Crouched) - 386.0).abs() < 1e-5);
        assert!((launch.throw_height(0, Stance::Prone) - 63.0).abs() < 1e-5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("physics.toml");
        fs::write(
            &path,
            "gravity = 30.0\n[surfaces.ground]\nrestitution = 1.5\nnormal = \"vertical\"\n",
        )
        .expect("write config");

        let text = fs::read_to_string(&path).expect("read config");
        let config: PhysicsConfig = toml::from_str(&text).expect("parse config");
        assert!((config.gravity - 30.0).abs() < 1e-6);
        assert!((config.surfaces.ground.restitution - 1.5).abs() < 1e-6);
        assert_eq!(config.surfaces.ground.friction, None);
        assert_eq!(config.substeps, 10);
    }
}
