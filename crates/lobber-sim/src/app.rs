//! Scenario runner.

use std::path::Path;

use anyhow::{Context, Result};
use lobber_common::{ActorId, GridGeometry, GridNo, StructureId};
use lobber_physics::sandbox::{sample_description, SandboxHost, SandboxWorld};
use lobber_physics::{
    ActionCode, ActorRegistry, Fate, GetThrough, PhysicsEvent, PhysicsWorld, ThrowParameters, ThrownItem,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ActorSpec, ScenarioConfig, SimConfig};

/// Outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Prediction made before the throw
    pub prediction: Prediction,
    /// Launch that was executed
    pub throw: ThrowParameters,
    /// How each object ended
    pub fates: Vec<Fate>,
    /// Ticks simulated
    pub ticks: u32,
    /// Objects still flying when the tick limit was hit
    pub unfinished: usize,
    /// Side effects recorded by the sandbox
    pub host_events: usize,
}

/// Serializable form of the get-through prediction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Prediction {
    /// The throw was predicted to arrive
    pub succeeded: bool,
    /// Predicted end cell as (col, row)
    pub final_cell: Option<(i32, i32)>,
    /// Predicted end level
    pub final_level: u8,
}

impl Prediction {
    fn new(result: GetThrough, geometry: &GridGeometry) -> Self {
        Self {
            succeeded: result.succeeded,
            final_cell: result.final_grid.map(|grid| geometry.col_row(grid)),
            final_level: result.final_level,
        }
    }
}

fn cell(geometry: &GridGeometry, col: i32, row: i32) -> Result<GridNo> {
    geometry
        .checked_grid_no(col, row)
        .with_context(|| format!("cell ({col}, {row}) is not on the {}x{} map", geometry.cols, geometry.rows))
}

fn build_world(scenario: &ScenarioConfig, geometry: GridGeometry) -> Result<SandboxWorld> {
    let mut world = SandboxWorld::new(geometry);
    for &[col, row] in &scenario.roofs {
        world.set_roof(cell(&geometry, col, row)?);
    }
    for &[col, row] in &scenario.water {
        world.set_water(cell(&geometry, col, row)?);
    }
    for (index, structure) in scenario.structures.iter().enumerate() {
        let grid = cell(&geometry, structure.col, structure.row)?;
        world.set_structure(grid, StructureId::new(index as u16 + 1), structure.height);
    }
    Ok(world)
}

fn place_actor(host: &mut SandboxHost, geometry: &GridGeometry, spec: &ActorSpec) -> Result<ActorId> {
    let grid = cell(geometry, spec.col, spec.row)?;
    let actor = host.add_actor(grid, spec.level, spec.stance, spec.dexterity);
    host.set_toss_range(actor, spec.toss_range);
    Ok(actor)
}

/// Runs a scenario to completion.
pub fn run(config: &SimConfig, snapshot: Option<&Path>) -> Result<SimReport> {
    let scenario = &config.scenario;
    let geometry = GridGeometry::new(scenario.cols, scenario.rows, GridGeometry::STANDARD.cell_size)
        .context("invalid map size")?;

    let mut host = SandboxHost::new(build_world(scenario, geometry)?, scenario.seed);
    let thrower = place_actor(&mut host, &geometry, &scenario.thrower)?;
    let catcher = match &scenario.catcher {
        Some(spec) => Some(place_actor(&mut host, &geometry, spec)?),
        None => None,
    };
    let target = cell(&geometry, scenario.target_col, scenario.target_row)?;
    let item = ThrownItem::new(sample_description(scenario.item), scenario.item_status);
    let armed = scenario.action == ActionCode::ArmedThrow;

    let mut world = PhysicsWorld::new(config.physics.clone());

    let prediction = world
        .chance_to_get_through(
            &host,
            thrower,
            &item,
            target,
            scenario.target_level,
            scenario.target_height,
            armed,
            false,
        )
        .context("predicting the throw")?;
    info!(
        succeeded = prediction.succeeded,
        final_grid = ?prediction.final_grid,
        "predicted throw"
    );

    let throw = world
        .calculate_params_for_throw(
            &mut host,
            thrower,
            target,
            scenario.target_level,
            scenario.target_height,
            &item,
            scenario.miss_by,
            scenario.action,
            catcher,
        )
        .context("computing launch parameters")?;
    info!(origin = ?throw.origin, force = ?throw.force, "throw computed");

    world
        .launch(&host, &throw, Some(thrower))
        .context("launching the throw")?;

    if let Some(path) = snapshot {
        world
            .snapshot()
            .save_to_file(path)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
    }

    let mut ticks = 0;
    let mut fates = Vec::new();
    let mut in_flight = world.objects().len();
    while in_flight > 0 && ticks < scenario.max_ticks {
        in_flight = world.simulate_world(&mut host);
        ticks += 1;

        for event in world.drain_events() {
            debug!(?event, "physics event");
            if let PhysicsEvent::Finished { fate, .. } = event {
                info!(?fate, ticks, "object finished");
                fates.push(fate);
            }
        }
    }

    if in_flight > 0 {
        warn!(in_flight, ticks, "tick limit reached, removing remaining objects");
        world.remove_all(&mut host);
    }
    if let Some(actor) = catcher {
        let caught = host.inventory(actor).len();
        let catching = host.actor(actor).is_some_and(|info| info.catching);
        info!(%actor, caught, catching, "catcher state");
    }

    Ok(SimReport {
        prediction: Prediction::new(prediction, &geometry),
        throw,
        fates,
        ticks,
        unfinished: in_flight,
        host_events: host.events().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StructureSpec;
    use lobber_physics::ItemKind;

    #[test]
    fn test_default_scenario_detonates() {
        let report = run(&SimConfig::default(), None).expect("scenario runs");
        assert!(report.prediction.succeeded);
        assert_eq!(report.unfinished, 0);
        assert!(matches!(report.fates.as_slice(), [Fate::Detonated { .. }]));
    }

    #[test]
    fn test_rock_is_dropped_near_target() {
        let mut config = SimConfig::default();
        config.scenario.item = ItemKind::Rock;
        config.scenario.action = ActionCode::FreeFall;

        let report = run(&config, None).expect("scenario runs");
        let [Fate::Landed { grid: Some(grid), level: 0 }] = report.fates.as_slice() else {
            panic!("unexpected fates {:?}", report.fates);
        };
        let target = GridGeometry::STANDARD.grid_no(50, 40).expect("cell");
        assert!(GridGeometry::STANDARD.pyth_spaces(*grid, target) <= 2);
    }

    #[test]
    fn test_blocked_scenario_predicts_failure() {
        let mut config = SimConfig::default();
        config.scenario.structures = (30..=50)
            .map(|row| StructureSpec {
                col: 45,
                row,
                height: 5_000.0,
            })
            .collect();

        let report = run(&config, None).expect("scenario runs");
        assert!(!report.prediction.succeeded);
    }

    #[test]
    fn test_off_map_target_is_an_error() {
        let mut config = SimConfig::default();
        config.scenario.target_col = 500;
        assert!(run(&config, None).is_err());
    }

    #[test]
    fn test_snapshot_is_written() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("launch.bin");
        run(&SimConfig::default(), Some(&path)).expect("scenario runs");

        let snapshot = lobber_physics::PhysicsSnapshot::load_from_file(&path).expect("snapshot");
        assert_eq!(snapshot.len(), 1);
    }
}
