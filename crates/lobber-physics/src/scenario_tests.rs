//! End-to-end scenarios on the sandbox map: compute a throw, launch it and
//! run the world until everything has come to rest.

use glam::Vec3;
use lobber_common::{GridGeometry, GridNo, StructureId};

use crate::events::PhysicsEvent;
use crate::host::{ActorRegistry, SoundEffect, Stance};
use crate::item::ItemKind;
use crate::lifecycle::Fate;
use crate::object::{ActionCode, LaunchSpec};
use crate::sandbox::{sample_item, HostEvent, SandboxHost, SandboxWorld};
use crate::save::PhysicsSnapshot;
use crate::world::PhysicsWorld;

fn cell(col: i32, row: i32) -> GridNo {
    GridGeometry::STANDARD.grid_no(col, row).expect("cell on map")
}

fn host(seed: u64) -> SandboxHost {
    SandboxHost::new(SandboxWorld::new(GridGeometry::STANDARD), seed)
}

/// Runs the world until it is empty and returns every fate reported.
fn run_to_rest(world: &mut PhysicsWorld, host: &mut SandboxHost) -> Vec<Fate> {
    let mut ticks = 0;
    while world.simulate_world(host) > 0 {
        ticks += 1;
        assert!(ticks < 4_000, "objects never came to rest");
    }
    world
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            PhysicsEvent::Finished { fate, .. } => Some(fate),
            _ => None,
        })
        .collect()
}

#[test]
fn test_grenade_throw_detonates_at_target() {
    let mut host = host(21);
    let mut world = PhysicsWorld::default();
    let thrower = host.add_actor(cell(40, 40), 0, Stance::Standing, 70);
    let grenade = sample_item(ItemKind::Grenade);

    let throw = world
        .calculate_params_for_throw(
            &mut host,
            thrower,
            cell(50, 40),
            0,
            0.0,
            &grenade,
            0,
            ActionCode::ArmedThrow,
            None,
        )
        .expect("known actor");
    world.launch(&host, &throw, Some(thrower)).expect("slot");

    let fates = run_to_rest(&mut world, &mut host);
    let [Fate::Detonated { grid }] = fates.as_slice() else {
        panic!("unexpected fates {fates:?}");
    };
    assert!(GridGeometry::STANDARD.pyth_spaces(*grid, cell(50, 40)) <= 2);
    assert!(host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::Explosion(detonation) if detonation.owner == Some(thrower))));
    assert!(host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::AttackResolved(actor) if *actor == thrower)));
}

#[test]
fn test_pass_is_caught_by_nimble_catcher() {
    let mut host = host(4);
    let mut world = PhysicsWorld::default();
    let passer = host.add_actor(cell(40, 40), 0, Stance::Standing, 70);
    let catcher = host.add_actor(cell(46, 40), 0, Stance::Standing, 100);
    let rock = sample_item(ItemKind::Rock);

    let throw = world
        .calculate_params_for_throw(
            &mut host,
            passer,
            cell(46, 40),
            0,
            0.0,
            &rock,
            0,
            ActionCode::ThrownToCatch,
            Some(catcher),
        )
        .expect("known actor");
    assert_eq!(throw.target, Some(catcher));
    world.launch(&host, &throw, Some(passer)).expect("slot");

    let fates = run_to_rest(&mut world, &mut host);
    assert_eq!(fates, vec![Fate::Caught { actor: catcher }]);
    assert_eq!(host.inventory(catcher), &[rock]);
    assert!(host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::CatchStarted(actor) if *actor == catcher)));
    assert!(host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::SoundAt(_, SoundEffect::CatchObject))));
    assert!(!host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::ItemAdded { .. })));
    assert!(!host.actor(catcher).expect("catcher").catching);
}

#[test]
fn test_tall_structure_blocks_throw() {
    let mut host = host(8);
    let world = PhysicsWorld::default();
    let thrower = host.add_actor(cell(40, 40), 0, Stance::Standing, 70);
    for row in 30..=50 {
        host.world_mut()
            .set_structure(cell(45, row), StructureId::new(3), 5_000.0);
    }

    let result = world
        .chance_to_get_through(
            &host,
            thrower,
            &sample_item(ItemKind::Grenade),
            cell(50, 40),
            0,
            0.0,
            true,
            false,
        )
        .expect("known actor");
    assert!(!result.succeeded);
}

#[test]
fn test_computing_a_throw_only_touches_the_thrower() {
    let mut host = host(2);
    let world = PhysicsWorld::default();
    let thrower = host.add_actor(cell(40, 40), 0, Stance::Prone, 70);
    let before = host.world().query_count();

    world
        .calculate_params_for_throw(
            &mut host,
            thrower,
            cell(52, 47),
            0,
            0.0,
            &sample_item(ItemKind::Rock),
            12,
            ActionCode::FreeFall,
            None,
        )
        .expect("known actor");

    assert!(host.world().query_count() > before);
    assert_eq!(
        host.events(),
        &[
            HostEvent::AttackTarget(thrower, None),
            HostEvent::ThrowQueued(thrower),
        ]
    );
}

#[test]
fn test_mortar_fire_mission() {
    let mut host = host(13);
    let mut world = PhysicsWorld::default();
    let gunner = host.add_actor(cell(20, 80), 0, Stance::Crouched, 70);
    host.set_toss_range(gunner, 25);
    let shell = sample_item(ItemKind::MortarShell);

    let throw = world
        .calculate_params_for_throw(
            &mut host,
            gunner,
            cell(50, 80),
            0,
            0.0,
            &shell,
            0,
            ActionCode::ArmedThrow,
            None,
        )
        .expect("known actor");
    let expected_z = world.config().launch.mortar_start_offset;
    assert!((throw.origin.z - expected_z).abs() < 1e-6);
    world.launch(&host, &throw, Some(gunner)).expect("slot");

    let fates = run_to_rest(&mut world, &mut host);
    assert!(matches!(fates.as_slice(), [Fate::Detonated { .. }]));
    let whistles = host
        .events()
        .iter()
        .filter(|event| matches!(event, HostEvent::SoundStarted(SoundEffect::MortarWhistle)))
        .count();
    assert_eq!(whistles, 1);
    assert!(host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::SoundStopped(_))));
}

#[test]
fn test_restored_world_resumes_mid_flight() {
    let mut first_host = host(30);
    let mut second_host = host(30);
    let mut first = PhysicsWorld::default();
    let mut second = PhysicsWorld::default();

    for (col, force) in [(30, 250.0), (60, 400.0), (90, 150.0)] {
        let geometry = GridGeometry::STANDARD;
        let spec = LaunchSpec {
            item: sample_item(ItemKind::Rock),
            life_length: None,
            position: geometry.center(cell(col, 70)).extend(191.0),
            force: Vec3::new(0.0, force, force),
            owner: None,
            action: ActionCode::FreeFall,
            target: None,
        };
        first
            .create_physical_object(first_host.world(), spec)
            .expect("slot");
    }
    for _ in 0..4 {
        first.simulate_world(&mut first_host);
    }

    let bytes = first.snapshot().to_bytes().expect("encode");
    second
        .restore(&PhysicsSnapshot::from_bytes(&bytes).expect("decode"))
        .expect("restore");
    assert_eq!(second.positions(), first.positions());

    loop {
        let left = first.simulate_world(&mut first_host);
        assert_eq!(second.simulate_world(&mut second_host), left);
        assert_eq!(second.positions(), first.positions());
        if left == 0 {
            break;
        }
    }
}

#[test]
fn test_remove_all_stops_whistle() {
    let mut host = host(17);
    let mut world = PhysicsWorld::default();
    let spec = LaunchSpec {
        item: sample_item(ItemKind::MortarShell),
        life_length: None,
        position: GridGeometry::STANDARD.center(cell(80, 80)).extend(50.0),
        force: Vec3::new(300.0, 0.0, 900.0),
        owner: None,
        action: ActionCode::ArmedThrow,
        target: None,
    };
    let handle = world
        .create_physical_object(host.world(), spec)
        .expect("slot");

    while world
        .get(handle)
        .is_some_and(|shell| shell.sound.is_none())
    {
        world.simulate_world(&mut host);
    }
    let sound = world
        .get(handle)
        .and_then(|shell| shell.sound)
        .expect("whistle playing");

    assert_eq!(world.remove_all(&mut host), 1);
    assert!(host
        .events()
        .contains(&HostEvent::SoundStopped(sound)));
    assert!(!host
        .events()
        .iter()
        .any(|event| matches!(event, HostEvent::Explosion(_))));
}
