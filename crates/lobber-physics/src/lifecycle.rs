//! Per-tick object lifecycle.
//!
//! [`step`] advances one object by one tick: life bookkeeping, forces,
//! sub-stepped integration with collision handling, then the cell-level
//! move (sprites, catching, smoke trails). An object that dies during the
//! tick is terminated before `step` returns and its [`Fate`] is reported.
//!
//! Side effects only happen for [`SimulationMode::Live`] objects driven by a
//! [`Simulation::Live`] host. Probes see nothing but read-only geometry.

use lobber_common::{height_units_to_pixels, object_level, ActorId, GridNo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::collision::{self, CollisionHit, CollisionKind, Obstacle, Resolution};
use crate::config::PhysicsConfig;
use crate::host::{
    Detonation, Effect, Host, NoiseKind, ScreenOffset, SoundEffect, Visibility, WorldGeometry,
};
use crate::integrator::{compute_forces, integrate};
use crate::item::{Detonator, ItemKind};
use crate::object::{ActionCode, AttachedVisual, PhysicalObject, SimulationMode};

/// Base loudness of a landing item.
const IMPACT_VOLUME: u32 = 9;

/// What the simulation may touch while stepping an object.
pub enum Simulation<'a> {
    /// Full host access
    Live(&'a mut dyn Host),
    /// Read-only map queries
    Probe(&'a dyn WorldGeometry),
}

impl<'a> Simulation<'a> {
    /// Map queries.
    #[must_use]
    pub fn world(&self) -> &dyn WorldGeometry {
        match self {
            Self::Live(host) => host.geometry(),
            Self::Probe(world) => *world,
        }
    }

    /// Host access for objects that are allowed side effects.
    fn effects(&mut self, mode: SimulationMode) -> Option<&mut (dyn Host + 'a)> {
        match self {
            Self::Live(host) if !mode.is_probe() => Some(&mut **host),
            _ => None,
        }
    }
}

/// How an object's flight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fate {
    /// Came to rest (or expired) and was dropped or discarded
    Landed {
        /// Cell it ended in
        grid: Option<GridNo>,
        /// Building level the item was dropped on
        level: u8,
    },
    /// Exploded or lit up
    Detonated {
        /// Cell of the blast
        grid: GridNo,
    },
    /// Failed to go off and was left in the world
    Dud {
        /// Cell it was left in
        grid: GridNo,
        /// Left behind with a timed fuse
        booby_trapped: bool,
    },
    /// Caught by the intended catcher
    Caught {
        /// Catcher
        actor: ActorId,
    },
    /// Sank in water
    Sank {
        /// Cell of the splash
        grid: Option<GridNo>,
    },
    /// Flew off the map
    LeftWorld,
}

/// Result of stepping an object for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still in flight
    Flying,
    /// Terminated this tick
    Finished(Fate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Advances an object by one tick.
pub fn step(
    object: &mut PhysicalObject,
    sim: &mut Simulation<'_>,
    config: &PhysicsConfig,
) -> StepOutcome {
    object.life_span += config.tick_duration;
    if object
        .life_length
        .is_some_and(|limit| object.life_span > limit)
    {
        object.alive = false;
    }
    let on_map = object
        .grid
        .is_some_and(|grid| sim.world().is_visible_tile(grid));
    if !on_map {
        object.alive = false;
    }
    if !object.alive {
        return StepOutcome::Finished(terminate(object, sim, config));
    }

    compute_forces(object, config.gravity);

    let dt = config.substep_duration();
    let mut completed = true;
    for _ in 0..config.substeps {
        if integrate(object, dt, config.force_time_base) {
            start_whistle(object, sim);
        }

        let flow = handle_collisions(object, sim, config);
        if !object.alive {
            return StepOutcome::Finished(terminate(object, sim, config));
        }
        if flow == Flow::Stop {
            completed = false;
            break;
        }
    }

    if completed {
        if let Some(fate) = move_object(object, sim, config) {
            return StepOutcome::Finished(fate);
        }
    }

    StepOutcome::Flying
}

fn handle_collisions(
    object: &mut PhysicalObject,
    sim: &mut Simulation<'_>,
    config: &PhysicsConfig,
) -> Flow {
    let Some(hit) = collision::detect(object, sim.world(), config) else {
        return Flow::Continue;
    };
    collision::count_repeat(&mut object.collision, hit.kind);

    if let CollisionKind::Window(_) = hit.kind {
        if let Some(host) = sim.effects(object.mode) {
            if let Some(grid) = host.geometry().grid().grid_at_position(object.position) {
                host.window_hit(grid, hit.obstacle);
            }
        }
        return Flow::Continue;
    }

    if object.item.detonates_on_impact() {
        trace!("impact detonation");
        object.alive = false;
        return Flow::Stop;
    }

    match hit.kind {
        CollisionKind::Ground => {
            if !object.hit_ground_once {
                if let (Some(host), Some(grid)) = (sim.effects(object.mode), object.grid) {
                    host.play_at(grid, SoundEffect::ThrowImpact);
                }
            }
            object.hit_ground_once = true;
        },
        CollisionKind::Water => {
            splash(object, sim);
            return Flow::Stop;
        },
        CollisionKind::StructureZ | CollisionKind::Actor | CollisionKind::Structure => {
            if catch_on_contact(object, sim, hit.obstacle) {
                return Flow::Stop;
            }
            strike_actor(object, sim, hit.obstacle);
        },
        _ => {},
    }

    respond(object, &hit, config)
}

fn respond(object: &mut PhysicalObject, hit: &CollisionHit, config: &PhysicsConfig) -> Flow {
    if !collision::prepare_response(object, hit, &config.surfaces) {
        return Flow::Stop;
    }
    match collision::resolve(object, hit.kind, config) {
        Resolution::Settled => Flow::Continue,
        Resolution::Rebounded | Resolution::Runaway => Flow::Stop,
    }
}

fn splash(object: &mut PhysicalObject, sim: &mut Simulation<'_>) {
    object.alive = false;
    if !object.visible {
        return;
    }
    let Some(host) = sim.effects(object.mode) else {
        return;
    };

    object.visible = false;
    object.in_water = true;
    if let Some(visual) = object.visual {
        host.hide(visual.node);
    }
    if let Some(grid) = host.geometry().grid().grid_at_position(object.position) {
        host.spawn_effect(Effect::Ripple {
            grid,
            at: screen_offset(object),
            chained_explosion: object.is_armed(),
        });
    }
    debug!(item = %object.item.description.name, "object fell into water");
}

fn start_whistle(object: &mut PhysicalObject, sim: &mut Simulation<'_>) {
    if !object.item.is_mortar_shell() || !object.is_armed() || object.sound.is_some() {
        return;
    }
    if let Some(host) = sim.effects(object.mode) {
        object.sound = Some(host.play(SoundEffect::MortarWhistle));
    }
}

/// The intended catcher touched the object.
fn catch_on_contact(object: &mut PhysicalObject, sim: &mut Simulation<'_>, obstacle: Obstacle) -> bool {
    if object.action != ActionCode::ThrownToCatch {
        return false;
    }
    let Some(actor) = obstacle.actor() else {
        return false;
    };
    if object.target != Some(actor) {
        return false;
    }
    let Some(host) = sim.effects(object.mode) else {
        return false;
    };

    host.end_catch(actor);
    if let Some(info) = host.actor(actor) {
        host.play_at(info.grid, SoundEffect::CatchObject);
    }
    object.catch.animating = false;

    if !object.catch.good {
        return false;
    }
    if host.take_item(actor, &object.item) {
        object.drop_item = false;
        info!(%actor, item = %object.item.description.name, "object caught");
    }
    object.alive = false;
    true
}

fn strike_actor(object: &mut PhysicalObject, sim: &mut Simulation<'_>, obstacle: Obstacle) {
    let Some(actor) = obstacle.actor() else {
        return;
    };
    if object.last_struck == Some(actor) {
        return;
    }
    if let Some(host) = sim.effects(object.mode) {
        host.struck_by_object(actor, object.owner);
        object.last_struck = Some(actor);
    }
}

/// Rolls for a catch as the object closes in on its catcher.
fn approach_catcher(
    object: &mut PhysicalObject,
    host: &mut dyn Host,
    grid: GridNo,
    config: &PhysicsConfig,
) -> bool {
    if object.action != ActionCode::ThrownToCatch {
        return false;
    }
    let Some(target) = object.target else {
        return false;
    };
    let Some(catcher) = host.actor(target) else {
        return false;
    };

    let spaces = host.geometry().grid().pyth_spaces(grid, catcher.grid);
    if spaces < config.catch_start_spaces && !object.catch.attempted {
        if !catcher.catching {
            host.begin_catch(target);
            object.catch.animating = true;
        }
        object.catch.attempted = true;
    }

    if spaces <= config.catch_attempt_spaces && !object.catch.checked {
        object.catch.checked = true;
        let chance = config.catch_base_chance + u32::from(catcher.dexterity) / 2;
        if host.rng().chance(chance) {
            debug!(%target, chance, "catch roll succeeded");
            object.catch.good = true;
            return true;
        }
        debug!(%target, chance, "catch roll failed");
    }
    false
}

/// Cell-level bookkeeping after a full tick.
fn move_object(
    object: &mut PhysicalObject,
    sim: &mut Simulation<'_>,
    config: &PhysicsConfig,
) -> Option<Fate> {
    let new_grid = sim.world().grid().grid_at_position(object.position);
    if object.first_move_pending {
        object.first_move_pending = false;
        object.first_grid = new_grid;
    }

    let Some(new_grid) = new_grid else {
        object.alive = false;
        if let Some(host) = sim.effects(object.mode) {
            release(object, host);
        }
        debug!("object left the map");
        return Some(Fate::LeftWorld);
    };

    let entered = object.grid != Some(new_grid);
    let host = sim.effects(object.mode);

    if let Some(host) = host {
        if entered || object.visual.is_none() {
            if object.visible && approach_catcher(object, host, new_grid, config) {
                object.visible = false;
            }

            if object.visible {
                redraw(object, host, new_grid, entered);
            } else {
                detach_visual(object, host);
            }
        }

        let trails_smoke = object.item.is_mortar_shell() && object.is_armed();
        if object.visible && !trails_smoke {
            if let Some(visual) = object.visual {
                let land = height_units_to_pixels(host.geometry().land_height(new_grid)) as i32;
                let at = screen_offset(object);
                host.place(visual.node, at);
                host.place(visual.shadow, ScreenOffset { z: land, ..at });
            }
        }
    }

    if entered {
        object.tiles_moved += 1;
    }
    object.grid = Some(new_grid);
    None
}

fn redraw(object: &mut PhysicalObject, host: &mut dyn Host, new_grid: GridNo, entered: bool) {
    if object.item.is_mortar_shell() && object.is_armed() && object.tiles_moved > 2 {
        if entered {
            let delay_ms = 100 + host.rng().below(100) as u16;
            host.spawn_effect(Effect::SmokeTrail {
                grid: new_grid,
                at: screen_offset(object),
                delay_ms,
            });
        }
    } else if object.tiles_moved > 0 && entered {
        detach_visual(object, host);
        let tile = object.item.description.tile;
        object.visual = Some(AttachedVisual {
            node: host.attach_sprite(new_grid, tile),
            shadow: host.attach_shadow(new_grid, tile),
            grid: new_grid,
        });
    }
}

fn detach_visual(object: &mut PhysicalObject, host: &mut dyn Host) {
    if let Some(visual) = object.visual.take() {
        host.detach(visual.node);
        host.detach(visual.shadow);
    }
}

/// Drops every host resource the object holds without landing it.
pub(crate) fn release(object: &mut PhysicalObject, host: &mut dyn Host) {
    if let Some(sound) = object.sound.take() {
        host.stop(sound);
    }
    detach_visual(object, host);
    if let Some(owner) = object.owner {
        host.attack_resolved(owner);
    }
}

fn screen_offset(object: &PhysicalObject) -> ScreenOffset {
    ScreenOffset {
        x: object.position.x as i32,
        y: object.position.y as i32,
        z: height_units_to_pixels(object.position.z) as i32,
    }
}

/// Runs the terminal effects of a dead object.
fn terminate(object: &mut PhysicalObject, sim: &mut Simulation<'_>, config: &PhysicsConfig) -> Fate {
    object.alive = false;
    let grid = object.grid;
    let landing_level = u8::from(object.collision.last == Some(CollisionKind::Roof));

    let Some(host) = sim.effects(object.mode) else {
        return Fate::Landed {
            grid,
            level: landing_level,
        };
    };

    if let Some(sound) = object.sound.take() {
        host.stop(sound);
    }

    let mut fate = if object.is_armed() && !object.in_water {
        armed_impact(object, host, config)
    } else {
        let sinks = object.in_water && object.item.description.sinks;
        if !sinks && object.drop_item && !object.is_armed() {
            if let Some(cell) = grid {
                host.add_item(cell, landing_level, &object.item, Visibility::Visible, false);
            }
        }
        if object.in_water {
            Fate::Sank { grid }
        } else {
            Fate::Landed {
                grid,
                level: landing_level,
            }
        }
    };

    if object.action == ActionCode::ThrownToCatch && !object.drop_item {
        if let Some(actor) = object.target {
            fate = Fate::Caught { actor };
        }
    }

    if let Some(cell) = grid {
        let noise = match object.item.kind() {
            ItemKind::Rock => Some(NoiseKind::RockImpact),
            ItemKind::Grenade => Some(NoiseKind::GrenadeImpact),
            _ => None,
        };
        if let Some(kind) = noise {
            let volume = (IMPACT_VOLUME + host.rng().below(IMPACT_VOLUME)) as u8;
            host.make_noise(object.owner, cell, volume, kind);
        }
        if object.collision.last == Some(CollisionKind::Ground) {
            host.play_at(cell, SoundEffect::ThrowImpact);
        }
    }

    if let Some(owner) = object.owner {
        host.attack_resolved(owner);
    }

    if object.catch.animating {
        object.catch.animating = false;
        if let Some(target) = object.target {
            host.end_catch(target);
            if let Some(info) = host.actor(target) {
                host.play_at(info.grid, SoundEffect::CatchObject);
            }
        }
    }

    detach_visual(object, host);
    debug!(?fate, "object terminated");
    fate
}

/// Detonation, dud handling and flares for armed objects.
fn armed_impact(object: &mut PhysicalObject, host: &mut dyn Host, config: &PhysicsConfig) -> Fate {
    let Some(grid) = object.grid else {
        return Fate::LeftWorld;
    };
    let land = host.geometry().land_height(grid);
    let z_pixels =
        height_units_to_pixels(object.position.z) as i32 - height_units_to_pixels(land) as i32;

    if object.item.description.thrown {
        host.add_item(grid, 0, &object.item, Visibility::Hidden, false);
    }

    let kind = object.item.kind();
    if matches!(kind, ItemKind::Grenade | ItemKind::MortarShell) {
        let status = object.item.status;
        let detonates = z_pixels != 0
            || object.in_water
            || dud_roll(host, status, config.dud_status_threshold);

        if !detonates {
            let booby_trapped = dud_roll(host, status, config.dud_status_threshold);
            if booby_trapped {
                object.item.detonator = Detonator::Timed {
                    delay: 1 + host.rng().below(2) as u8,
                };
            }
            let level = u8::from(object.collision.last == Some(CollisionKind::Roof));
            host.add_item(grid, level, &object.item, Visibility::Hidden, booby_trapped);
            host.notify_item_watchers();
            if let Some(owner) = object.owner {
                host.curse(owner);
            }
            info!(item = %object.item.description.name, booby_trapped, "dud");
            return Fate::Dud {
                grid,
                booby_trapped,
            };
        }
    }

    match kind {
        ItemKind::BreakLight => {
            if object.position.z > 0.0 {
                host.add_item(grid, 1, &object.item, Visibility::Visible, false);
                return Fate::Landed { grid: Some(grid), level: 1 };
            }
            host.light_flare(grid);
        },
        ItemKind::Grenade => host.ignite_explosion(Detonation {
            owner: object.owner,
            position: object.position,
            z_pixels,
            grid,
            item: object.item.id(),
            level: object_level(object.position.z - land),
        }),
        ItemKind::MortarShell => host.ignite_explosion(Detonation {
            owner: object.owner,
            position: object.position,
            z_pixels: height_units_to_pixels(object.position.z) as i32,
            grid,
            item: object.item.id(),
            level: object_level(object.position.z - land),
        }),
        _ => return Fate::Landed { grid: Some(grid), level: 0 },
    }

    info!(%grid, item = %object.item.description.name, "detonated");
    Fate::Detonated { grid }
}

/// Condition-weighted roll shared by the dud and booby-trap checks.
fn dud_roll(host: &mut dyn Host, status: u8, threshold: u8) -> bool {
    if status < threshold {
        return false;
    }
    let rng = host.rng();
    let roll = rng.below(100);
    roll < u32::from(status) + rng.below(50)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::LaunchSpec;
    use crate::sandbox::{sample_item, HostEvent, SandboxHost, SandboxWorld};
    use glam::Vec3;
    use lobber_common::GridGeometry;

    fn launch(host: &SandboxHost, kind: ItemKind, position: Vec3, force: Vec3, action: ActionCode) -> PhysicalObject {
        let spec = LaunchSpec {
            item: sample_item(kind),
            life_length: None,
            position,
            force,
            owner: None,
            action,
            target: None,
        };
        PhysicalObject::launch(spec, host.geometry(), &PhysicsConfig::default())
    }

    fn run(object: &mut PhysicalObject, host: &mut SandboxHost, config: &PhysicsConfig) -> Fate {
        for _ in 0..2000 {
            let mut sim = Simulation::Live(&mut *host);
            if let StepOutcome::Finished(fate) = step(object, &mut sim, config) {
                return fate;
            }
        }
        panic!("object never came to rest");
    }

    #[test]
    fn test_rock_lands_and_is_dropped() {
        let config = PhysicsConfig::default();
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 3);
        let mut rock = launch(
            &host,
            ItemKind::Rock,
            Vec3::new(805.0, 805.0, 191.0),
            Vec3::new(300.0, 0.0, 300.0),
            ActionCode::FreeFall,
        );

        let fate = run(&mut rock, &mut host, &config);
        let Fate::Landed { grid: Some(grid), level: 0 } = fate else {
            panic!("unexpected fate {fate:?}");
        };
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::ItemAdded { grid: g, visibility: Visibility::Visible, .. } if *g == grid)));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::Noise { kind: NoiseKind::RockImpact, .. })));
        assert!(rock.visual.is_none());
    }

    #[test]
    fn test_mortar_detonates_on_first_impact() {
        let config = PhysicsConfig::default();
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 3);
        let mut shell = launch(
            &host,
            ItemKind::MortarShell,
            Vec3::new(805.0, 805.0, 50.0),
            Vec3::new(200.0, 0.0, 600.0),
            ActionCode::ArmedThrow,
        );
        shell.item.status = 100;

        let fate = run(&mut shell, &mut host, &config);
        assert!(matches!(fate, Fate::Detonated { .. }));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::SoundStarted(SoundEffect::MortarWhistle))));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::Explosion(_))));
    }

    #[test]
    fn test_water_sinks_item() {
        let config = PhysicsConfig::default();
        let mut world = SandboxWorld::new(GridGeometry::STANDARD);
        let grid = GridGeometry::STANDARD;
        for col in 70..=90 {
            for row in 70..=90 {
                world.set_water(grid.grid_no(col, row).expect("cell"));
            }
        }
        let mut host = SandboxHost::new(world, 3);
        let mut rock = launch(
            &host,
            ItemKind::Rock,
            Vec3::new(805.0, 805.0, 191.0),
            Vec3::new(100.0, 0.0, 100.0),
            ActionCode::FreeFall,
        );
        rock.item.description.sinks = true;

        let fate = run(&mut rock, &mut host, &config);
        assert!(matches!(fate, Fate::Sank { .. }));
        assert!(rock.in_water);
        assert!(!host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::ItemAdded { .. })));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::Effect(Effect::Ripple { .. }))));
    }

    #[test]
    fn test_low_status_grenade_is_dud() {
        let config = PhysicsConfig::default();
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 3);
        let owner = host.add_actor(
            GridGeometry::STANDARD.grid_no(80, 80).expect("cell"),
            0,
            crate::host::Stance::Standing,
            60,
        );
        let mut grenade = launch(
            &host,
            ItemKind::Grenade,
            Vec3::new(805.0, 805.0, 191.0),
            Vec3::new(200.0, 0.0, 200.0),
            ActionCode::ArmedThrow,
        );
        grenade.owner = Some(owner);
        grenade.item.status = 10;

        let fate = run(&mut grenade, &mut host, &config);
        assert!(matches!(fate, Fate::Dud { booby_trapped: false, .. }));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::Cursed(actor) if *actor == owner)));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::AttackResolved(actor) if *actor == owner)));
        assert!(!host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::Explosion(_))));
    }

    #[test]
    fn test_expired_object_terminates_immediately() {
        let config = PhysicsConfig::default();
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 3);
        let mut rock = launch(
            &host,
            ItemKind::Rock,
            Vec3::new(805.0, 805.0, 191.0),
            Vec3::ZERO,
            ActionCode::FreeFall,
        );
        rock.life_length = Some(1.0);

        let mut sim = Simulation::Live(&mut host);
        let outcome = step(&mut rock, &mut sim, &config);
        assert!(matches!(outcome, StepOutcome::Finished(Fate::Landed { .. })));
        assert_eq!(rock.position.z, 191.0);
    }

    #[test]
    fn test_probe_objects_have_no_side_effects() {
        let config = PhysicsConfig::default();
        let host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 3);
        let mut probe = PhysicalObject::probe(
            sample_item(ItemKind::Grenade),
            Vec3::new(805.0, 805.0, 191.0),
            Vec3::new(300.0, 0.0, 300.0),
            0.0,
            SimulationMode::ProbeUnrestricted,
            host.geometry(),
            &config,
        );
        let mut sim = Simulation::Probe(host.geometry());
        let mut finished = false;
        for _ in 0..2000 {
            if let StepOutcome::Finished(_) = step(&mut probe, &mut sim, &config) {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert!(host.events().is_empty());
    }
}
