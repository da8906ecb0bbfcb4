//! The physics world: object pool, clock and event bus behind one context.

use glam::Vec3;
use lobber_common::{ActorId, GridNo};
use tracing::{debug, info};

use crate::clock::PhysicsClock;
use crate::config::PhysicsConfig;
use crate::error::PhysicsResult;
use crate::events::{EventBus, PhysicsEvent};
use crate::host::{Host, WorldGeometry};
use crate::item::ThrownItem;
use crate::launch::{self, GetThrough, ThrowParameters};
use crate::lifecycle::{self, Simulation, StepOutcome};
use crate::object::{ActionCode, LaunchSpec, PhysicalObject};
use crate::pool::{ObjectHandle, ObjectPool};
use crate::save::PhysicsSnapshot;

/// Owns every live object and drives them tick by tick.
#[derive(Debug)]
pub struct PhysicsWorld {
    pool: ObjectPool,
    config: PhysicsConfig,
    clock: PhysicsClock,
    events: EventBus,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    /// Creates an empty world. The configuration is validated first.
    #[must_use]
    pub fn new(mut config: PhysicsConfig) -> Self {
        config.validate();
        Self {
            pool: ObjectPool::new(config.pool_capacity),
            clock: PhysicsClock::new(config.update_interval_ms, config.max_catch_up_ticks),
            events: EventBus::default(),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// The object table.
    #[must_use]
    pub const fn objects(&self) -> &ObjectPool {
        &self.pool
    }

    /// Looks an object up.
    #[must_use]
    pub fn get(&self, handle: ObjectHandle) -> Option<&PhysicalObject> {
        self.pool.get(handle)
    }

    /// Puts a new object into flight.
    ///
    /// Fails only when every slot is taken, which callers should treat as
    /// fatal.
    pub fn create_physical_object(
        &mut self,
        world: &dyn WorldGeometry,
        spec: LaunchSpec,
    ) -> PhysicsResult<ObjectHandle> {
        let owner = spec.owner;
        let object = PhysicalObject::launch(spec, world, &self.config);
        let item = object.item.id();
        let position = object.position;
        let force = object.initial_force;

        let handle = self.pool.allocate(object)?;
        debug!(%handle, ?position, ?force, "object created");
        self.events.publish(PhysicsEvent::Launched {
            handle,
            item,
            owner,
        });
        Ok(handle)
    }

    /// Launches a throw computed by [`calculate_params_for_throw`](Self::calculate_params_for_throw).
    pub fn launch(
        &mut self,
        host: &dyn Host,
        params: &ThrowParameters,
        owner: Option<ActorId>,
    ) -> PhysicsResult<ObjectHandle> {
        let spec = LaunchSpec {
            item: params.item.clone(),
            life_length: params.life_length,
            position: params.origin,
            force: params.force,
            owner,
            action: params.action,
            target: params.target,
        };
        self.create_physical_object(host.geometry(), spec)
    }

    /// Advances every object by one tick.
    ///
    /// Objects that finish are released in the same tick. Returns the
    /// number of objects still in flight.
    pub fn simulate_world(&mut self, host: &mut dyn Host) -> usize {
        for handle in self.pool.handles() {
            let Some(object) = self.pool.get_mut(handle) else {
                continue;
            };
            let outcome = lifecycle::step(object, &mut Simulation::Live(&mut *host), &self.config);

            if let StepOutcome::Finished(fate) = outcome {
                if let Some(object) = self.pool.release(handle) {
                    debug!(%handle, ?fate, "object finished");
                    self.events.publish(PhysicsEvent::Finished {
                        handle,
                        item: object.item.id(),
                        fate,
                    });
                }
            }
        }
        self.pool.len()
    }

    /// Feeds wall-clock time to the tick clock and runs the ticks due.
    ///
    /// Returns the number of ticks simulated.
    pub fn update(&mut self, host: &mut dyn Host, elapsed_ms: u32) -> u32 {
        let ticks = self.clock.advance(elapsed_ms);
        for _ in 0..ticks {
            self.simulate_world(host);
        }
        ticks
    }

    /// Removes every object without landing it.
    ///
    /// Sounds are stopped, sprites detached and pending attacks resolved;
    /// carried items are not dropped.
    pub fn remove_all(&mut self, host: &mut dyn Host) -> usize {
        let mut removed = self.pool.clear();
        for object in &mut removed {
            lifecycle::release(object, host);
        }
        self.clock.reset();

        let count = removed.len();
        if count > 0 {
            info!(count, "removed all physics objects");
            self.events.publish(PhysicsEvent::Cleared { count });
        }
        count
    }

    /// Predicts whether a throw would get through.
    pub fn chance_to_get_through(
        &self,
        host: &dyn Host,
        actor: ActorId,
        item: &ThrownItem,
        target: GridNo,
        level: u8,
        end_z: f32,
        armed: bool,
        from_ui: bool,
    ) -> PhysicsResult<GetThrough> {
        launch::calculate_chance_to_get_through(
            host,
            &self.config,
            actor,
            item,
            target,
            level,
            end_z,
            armed,
            from_ui,
        )
    }

    /// Computes a throw and queues it on the actor.
    pub fn calculate_params_for_throw(
        &self,
        host: &mut dyn Host,
        actor: ActorId,
        target: GridNo,
        level: u8,
        end_z: f32,
        item: &ThrownItem,
        miss_by: i8,
        action: ActionCode,
        catcher: Option<ActorId>,
    ) -> PhysicsResult<ThrowParameters> {
        launch::calculate_params_for_throw(
            host,
            &self.config,
            actor,
            target,
            level,
            end_z,
            item,
            miss_by,
            action,
            catcher,
        )
    }

    /// Captures the object table.
    #[must_use]
    pub fn snapshot(&self) -> PhysicsSnapshot {
        PhysicsSnapshot::capture(&self.pool)
    }

    /// Replaces the object table with a snapshot.
    ///
    /// On error the current table is left untouched.
    pub fn restore(&mut self, snapshot: &PhysicsSnapshot) -> PhysicsResult<()> {
        self.pool = snapshot.restore(self.config.pool_capacity)?;
        self.clock.reset();
        info!(count = snapshot.len(), "physics table restored");
        self.events.publish(PhysicsEvent::Restored {
            count: snapshot.len(),
        });
        Ok(())
    }

    /// Takes the events published since the last call.
    pub fn drain_events(&self) -> Vec<PhysicsEvent> {
        self.events.drain()
    }

    /// Position of every object in flight, lowest slot first.
    #[must_use]
    pub fn positions(&self) -> Vec<(ObjectHandle, Vec3)> {
        self.pool
            .iter()
            .map(|(handle, object)| (handle, object.position))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Stance;
    use crate::item::ItemKind;
    use crate::lifecycle::Fate;
    use crate::sandbox::{sample_item, HostEvent, SandboxHost, SandboxWorld};
    use lobber_common::GridGeometry;

    fn rock_at(host: &SandboxHost, col: i32, row: i32) -> LaunchSpec {
        let geometry = host.world().grid();
        let cell = geometry.grid_no(col, row).expect("cell");
        LaunchSpec {
            item: sample_item(ItemKind::Rock),
            life_length: None,
            position: geometry.center(cell).extend(150.0),
            force: Vec3::new(200.0, 0.0, 200.0),
            owner: None,
            action: ActionCode::FreeFall,
            target: None,
        }
    }

    #[test]
    fn test_object_runs_until_released() {
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 5);
        let mut world = PhysicsWorld::default();
        let spec = rock_at(&host, 40, 40);
        let handle = world
            .create_physical_object(host.world(), spec)
            .expect("slot");

        let mut ticks = 0;
        while world.simulate_world(&mut host) > 0 {
            ticks += 1;
            assert!(ticks < 2_000, "rock never came to rest");
        }

        assert!(world.get(handle).is_none());
        assert_eq!(world.objects().count(), 0);
        let events = world.drain_events();
        assert!(matches!(events.first(), Some(PhysicsEvent::Launched { .. })));
        assert!(matches!(
            events.last(),
            Some(PhysicsEvent::Finished {
                fate: Fate::Landed { level: 0, .. },
                ..
            })
        ));
        assert!(host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::ItemAdded { .. })));
    }

    #[test]
    fn test_update_runs_due_ticks() {
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 5);
        let mut world = PhysicsWorld::default();
        let spec = rock_at(&host, 40, 40);
        let handle = world
            .create_physical_object(host.world(), spec)
            .expect("slot");
        let start = world.get(handle).expect("object").position;

        assert_eq!(world.update(&mut host, 5), 0);
        assert_eq!(world.get(handle).expect("object").position, start);
        assert_eq!(world.update(&mut host, 25), 3);
        assert!(world.get(handle).expect("object").position.x > start.x);
    }

    #[test]
    fn test_remove_all_releases_resources() {
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 5);
        let owner = host.add_actor(
            GridGeometry::STANDARD.grid_no(40, 40).expect("cell"),
            0,
            Stance::Standing,
            60,
        );
        let mut world = PhysicsWorld::default();
        for col in [40, 50, 60] {
            let mut spec = rock_at(&host, col, 40);
            spec.owner = Some(owner);
            world
                .create_physical_object(host.world(), spec)
                .expect("slot");
        }
        for _ in 0..3 {
            world.simulate_world(&mut host);
        }

        assert_eq!(world.remove_all(&mut host), 3);
        assert_eq!(world.objects().count(), 0);
        assert!(world.objects().is_empty());
        assert!(!host
            .events()
            .iter()
            .any(|event| matches!(event, HostEvent::ItemAdded { .. })));
        let resolved = host
            .events()
            .iter()
            .filter(|event| matches!(event, HostEvent::AttackResolved(actor) if *actor == owner))
            .count();
        assert_eq!(resolved, 3);
        assert!(matches!(
            world.drain_events().last(),
            Some(PhysicsEvent::Cleared { count: 3 })
        ));
    }

    #[test]
    fn test_restore_keeps_finished_handles_stale() {
        let mut host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 5);
        let mut world = PhysicsWorld::default();
        let mut expiring = rock_at(&host, 40, 40);
        expiring.life_length = Some(0.0);
        let finished = world
            .create_physical_object(host.world(), expiring)
            .expect("slot");
        let flying = world
            .create_physical_object(host.world(), rock_at(&host, 50, 40))
            .expect("slot");
        world.simulate_world(&mut host);
        assert!(world.get(finished).is_none());

        let mut restored = PhysicsWorld::default();
        restored.restore(&world.snapshot()).expect("restore");
        let fresh = restored
            .create_physical_object(host.world(), rock_at(&host, 60, 40))
            .expect("slot");

        assert_eq!(fresh.index(), finished.index());
        assert!(restored.get(finished).is_none());
        assert!(restored.get(fresh).is_some());
        assert!(restored.get(flying).is_some());
    }

    #[test]
    fn test_pool_exhaustion_is_reported() {
        let host = SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), 5);
        let config = PhysicsConfig {
            pool_capacity: 2,
            ..PhysicsConfig::default()
        };
        let mut world = PhysicsWorld::new(config);
        for _ in 0..2 {
            world
                .create_physical_object(host.world(), rock_at(&host, 40, 40))
                .expect("slot");
        }
        assert!(world
            .create_physical_object(host.world(), rock_at(&host, 40, 40))
            .is_err());
    }
}
