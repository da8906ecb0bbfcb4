//! In-memory collaborators.
//!
//! [`SandboxWorld`] is a small tile map (land heights, water, roofs, walls,
//! windows, structures and actor bodies). [`SandboxHost`] wraps it with an
//! actor registry and records every side effect as a [`HostEvent`] instead
//! of rendering or playing anything. Both back the test suite and the
//! command-line driver.

use std::cell::Cell;

use ahash::AHashMap;
use glam::{Vec2, Vec3};
use lobber_common::{ActorId, GridGeometry, GridNo, ItemTypeId, StructureId, HEIGHT_UNITS};

use crate::collision::{CollisionHit, CollisionKind, Facing, Obstacle};
use crate::host::{
    ActorInfo, ActorRegistry, Audio, Detonation, Effect, Host, ItemCatalog, ItemPool, NoiseKind,
    Ordnance, RandomSource, Renderer, ScreenOffset, SoundEffect, SoundHandle, Stance, Visibility,
    VisualHandle, WorldGeometry,
};
use crate::item::{ItemDescription, ItemKind, LauncherKind, ThrownItem};
use crate::launch::ThrowParameters;

/// Height of walls and windows above the land surface.
const WALL_HEIGHT: f32 = HEIGHT_UNITS;

#[derive(Debug, Clone, Copy, Default)]
struct Tile {
    land: f32,
    water: bool,
    roof: bool,
    hidden: bool,
    wall: Option<Facing>,
    window: Option<Facing>,
    structure: Option<(StructureId, f32)>,
}

#[derive(Debug, Clone, Copy)]
struct Body {
    actor: ActorId,
    level: u8,
    height: f32,
}

/// Tile map with simple box collision.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    geometry: GridGeometry,
    tiles: AHashMap<GridNo, Tile>,
    bodies: AHashMap<GridNo, Body>,
    underground: bool,
    queries: Cell<u64>,
}

impl SandboxWorld {
    /// Creates a flat, open map.
    #[must_use]
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            tiles: AHashMap::new(),
            bodies: AHashMap::new(),
            underground: false,
            queries: Cell::new(0),
        }
    }

    fn tile(&self, grid: GridNo) -> Tile {
        self.tiles.get(&grid).copied().unwrap_or_default()
    }

    fn tile_mut(&mut self, grid: GridNo) -> &mut Tile {
        self.tiles.entry(grid).or_default()
    }

    fn count_query(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    /// Sets the land height of a cell.
    pub fn set_land_height(&mut self, grid: GridNo, height: f32) {
        self.tile_mut(grid).land = height;
    }

    /// Turns a cell into water.
    pub fn set_water(&mut self, grid: GridNo) {
        self.tile_mut(grid).water = true;
    }

    /// Puts a roof one level above a cell.
    pub fn set_roof(&mut self, grid: GridNo) {
        self.tile_mut(grid).roof = true;
    }

    /// Puts a wall in a cell.
    pub fn set_wall(&mut self, grid: GridNo, facing: Facing) {
        self.tile_mut(grid).wall = Some(facing);
    }

    /// Puts a window in a cell.
    pub fn set_window(&mut self, grid: GridNo, facing: Facing) {
        self.tile_mut(grid).window = Some(facing);
    }

    /// Puts a structure of the given height in a cell.
    pub fn set_structure(&mut self, grid: GridNo, id: StructureId, height: f32) {
        self.tile_mut(grid).structure = Some((id, height));
    }

    /// Hides a cell from the playable area.
    pub fn set_hidden(&mut self, grid: GridNo) {
        self.tile_mut(grid).hidden = true;
    }

    /// Marks the map as a cave or basement.
    pub fn set_underground(&mut self, underground: bool) {
        self.underground = underground;
    }

    /// Places an actor body on a cell.
    pub fn set_body(&mut self, grid: GridNo, actor: ActorId, level: u8, height: f32) {
        self.bodies.insert(grid, Body { actor, level, height });
    }

    /// Removes whatever body stands on a cell.
    pub fn clear_body(&mut self, grid: GridNo) {
        self.bodies.remove(&grid);
    }

    /// Number of map queries answered so far (dimension lookups excluded).
    #[must_use]
    pub fn query_count(&self) -> u64 {
        self.queries.get()
    }

    fn side_normal(delta: Vec3) -> Vec3 {
        if delta.x.abs() >= delta.y.abs() {
            Vec3::new(-delta.x.signum(), 0.0, 0.0)
        } else {
            Vec3::new(0.0, -delta.y.signum(), 0.0)
        }
    }
}

impl WorldGeometry for SandboxWorld {
    fn grid(&self) -> GridGeometry {
        self.geometry
    }

    fn check_collision(&self, position: Vec3, delta: Vec3) -> Option<CollisionHit> {
        self.count_query();
        let grid = self.geometry.grid_at_position(position)?;
        let tile = self.tile(grid);
        let old = position - delta;
        let entered = self.geometry.grid_at_position(old) != Some(grid);

        if entered && position.z < tile.land + WALL_HEIGHT {
            if let Some(facing) = tile.window {
                return Some(
                    CollisionHit::new(CollisionKind::Window(facing))
                        .with_normal(Self::side_normal(delta)),
                );
            }
            if let Some(facing) = tile.wall {
                return Some(
                    CollisionHit::new(CollisionKind::Wall(facing))
                        .with_normal(Self::side_normal(delta)),
                );
            }
        }

        if tile.roof {
            let roof = tile.land + HEIGHT_UNITS;
            if old.z >= roof && position.z < roof {
                return Some(CollisionHit::new(CollisionKind::Roof).with_normal(Vec3::Z));
            }
            if old.z < roof && position.z >= roof {
                return Some(CollisionHit::new(CollisionKind::InteriorRoof).with_normal(Vec3::NEG_Z));
            }
        }

        if let Some(body) = self.bodies.get(&grid) {
            let base = tile.land + f32::from(body.level) * HEIGHT_UNITS;
            let top = base + body.height;
            if position.z >= base && position.z < top {
                let kind = if old.z >= top {
                    CollisionKind::StructureZ
                } else {
                    CollisionKind::Actor
                };
                return Some(CollisionHit::new(kind).with_obstacle(Obstacle::Actor(body.actor)));
            }
        }

        if let Some((id, height)) = tile.structure {
            let top = tile.land + height;
            if position.z < top && position.z >= tile.land {
                let kind = if old.z >= top {
                    CollisionKind::StructureZ
                } else {
                    CollisionKind::Structure
                };
                return Some(CollisionHit::new(kind).with_obstacle(Obstacle::Structure(id)));
            }
        }

        if position.z < tile.land {
            let kind = if tile.water {
                CollisionKind::Water
            } else {
                CollisionKind::Ground
            };
            return Some(CollisionHit::new(kind).with_normal(Vec3::Z));
        }

        None
    }

    fn land_height(&self, grid: GridNo) -> f32 {
        self.count_query();
        self.tile(grid).land
    }

    fn is_visible_tile(&self, grid: GridNo) -> bool {
        self.count_query();
        self.geometry.contains(grid) && !self.tile(grid).hidden
    }

    fn has_roof(&self, grid: GridNo) -> bool {
        self.count_query();
        self.tile(grid).roof
    }

    fn is_underground(&self) -> bool {
        self.count_query();
        self.underground
    }

    fn window_between(&self, from: GridNo, to: GridNo) -> Option<GridNo> {
        self.count_query();
        let start = self.geometry.center(from);
        let end = self.geometry.center(to);
        let span = start.distance(end);
        let steps = (span / (self.geometry.cell_size / 2.0)).ceil() as u32;
        (1..steps)
            .map(|step| start.lerp(end, step as f32 / steps as f32))
            .filter_map(|point: Vec2| self.geometry.grid_at(point.x, point.y))
            .find(|grid| *grid != from && *grid != to && self.tile(*grid).window.is_some())
    }
}

/// Catalog entry used by [`sample_item`] for each item family.
#[must_use]
pub fn sample_description(kind: ItemKind) -> ItemDescription {
    let (id, name, sinks, thrown, tile, fired_by) = match kind {
        ItemKind::Rock => (1, "rock", true, true, 10, None),
        ItemKind::Grenade => (2, "frag grenade", true, true, 11, None),
        ItemKind::MortarShell => (3, "mortar shell", true, false, 12, Some(LauncherKind::Mortar)),
        ItemKind::BreakLight => (4, "break light", false, true, 13, None),
        ItemKind::Launcher(LauncherKind::Mortar) => (5, "mortar", true, false, 14, None),
        ItemKind::Launcher(LauncherKind::GrenadeLauncher) => (6, "grenade launcher", true, false, 15, None),
        ItemKind::Launcher(LauncherKind::UnderbarrelLauncher) => (7, "underbarrel launcher", true, false, 16, None),
        ItemKind::Other => (8, "canteen", false, false, 17, None),
    };
    ItemDescription {
        id: ItemTypeId::new(id),
        name: name.to_string(),
        kind,
        sinks,
        thrown,
        tile,
        fired_by,
    }
}

/// A pristine item of the given family.
#[must_use]
pub fn sample_item(kind: ItemKind) -> ThrownItem {
    ThrownItem::new(sample_description(kind), 100)
}

/// Item catalog backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct SandboxCatalog {
    items: AHashMap<ItemTypeId, ItemDescription>,
}

impl SandboxCatalog {
    /// Catalog holding one sample entry per item family.
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::default();
        for kind in [
            ItemKind::Rock,
            ItemKind::Grenade,
            ItemKind::MortarShell,
            ItemKind::BreakLight,
            ItemKind::Launcher(LauncherKind::Mortar),
            ItemKind::Launcher(LauncherKind::GrenadeLauncher),
            ItemKind::Launcher(LauncherKind::UnderbarrelLauncher),
            ItemKind::Other,
        ] {
            catalog.insert(sample_description(kind));
        }
        catalog
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, description: ItemDescription) {
        self.items.insert(description.id, description);
    }
}

impl ItemCatalog for SandboxCatalog {
    fn describe(&self, id: ItemTypeId) -> Option<ItemDescription> {
        self.items.get(&id).cloned()
    }
}

/// Side effect recorded by [`SandboxHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Item dropped into the world
    ItemAdded {
        /// Cell
        grid: GridNo,
        /// Level
        level: u8,
        /// Item type
        item: ItemTypeId,
        /// Visibility
        visibility: Visibility,
        /// Left with a live fuse
        armed_bomb: bool,
    },
    /// Item watchers told to look around
    ItemWatchersNotified,
    /// Sprite attached
    SpriteAttached(VisualHandle, GridNo),
    /// Shadow attached
    ShadowAttached(VisualHandle, GridNo),
    /// Node moved
    Placed(VisualHandle, ScreenOffset),
    /// Node hidden
    Hidden(VisualHandle),
    /// Node detached
    Detached(VisualHandle),
    /// Effect spawned
    Effect(Effect),
    /// One-shot sound at a cell
    SoundAt(GridNo, SoundEffect),
    /// Attached sound started
    SoundStarted(SoundEffect),
    /// Attached sound stopped
    SoundStopped(SoundHandle),
    /// Audible noise
    Noise {
        /// Noise maker
        owner: Option<ActorId>,
        /// Cell
        grid: GridNo,
        /// Loudness
        volume: u8,
        /// Noise family
        kind: NoiseKind,
    },
    /// Explosive ignited
    Explosion(Detonation),
    /// Flare lit
    Flare(GridNo),
    /// Window broken
    WindowHit(GridNo),
    /// Attack target recorded
    AttackTarget(ActorId, Option<ActorId>),
    /// Throw queued for an actor
    ThrowQueued(ActorId),
    /// Catch animation started
    CatchStarted(ActorId),
    /// Catch animation ended
    CatchEnded(ActorId),
    /// Item moved into an inventory
    ItemTaken(ActorId, ItemTypeId),
    /// Actor struck by a flying object
    Struck(ActorId, Option<ActorId>),
    /// Actor swore
    Cursed(ActorId),
    /// Pending attack finished
    AttackResolved(ActorId),
}

#[derive(Debug, Clone)]
struct SandboxActor {
    info: ActorInfo,
    toss_range: u16,
    has_room: bool,
    attack_target: Option<ActorId>,
    inventory: Vec<ThrownItem>,
    queued: Vec<ThrowParameters>,
}

/// Recording host around a [`SandboxWorld`].
pub struct SandboxHost {
    world: SandboxWorld,
    actors: AHashMap<ActorId, SandboxActor>,
    next_actor: u16,
    next_handle: u32,
    events: Vec<HostEvent>,
    rng: fastrand::Rng,
}

impl SandboxHost {
    /// Creates a host with a seeded random source.
    #[must_use]
    pub fn new(world: SandboxWorld, seed: u64) -> Self {
        Self {
            world,
            actors: AHashMap::new(),
            next_actor: 1,
            next_handle: 1,
            events: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Body height of an actor in a posture.
    #[must_use]
    pub const fn body_height(stance: Stance) -> f32 {
        match stance {
            Stance::Standing => 200.0,
            Stance::Crouched => 140.0,
            Stance::Prone => 70.0,
        }
    }

    /// Adds an actor and gives it a body on the map.
    pub fn add_actor(&mut self, grid: GridNo, level: u8, stance: Stance, dexterity: u8) -> ActorId {
        let id = ActorId::new(self.next_actor);
        self.next_actor += 1;
        self.world.set_body(grid, id, level, Self::body_height(stance));
        self.actors.insert(
            id,
            SandboxActor {
                info: ActorInfo {
                    id,
                    grid,
                    level,
                    stance,
                    dexterity,
                    catching: false,
                },
                toss_range: 20,
                has_room: true,
                attack_target: None,
                inventory: Vec::new(),
                queued: Vec::new(),
            },
        );
        id
    }

    /// Sets how far an actor can toss.
    pub fn set_toss_range(&mut self, actor: ActorId, cells: u16) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.toss_range = cells;
        }
    }

    /// Fills an actor's inventory so catches cannot be kept.
    pub fn set_inventory_full(&mut self, actor: ActorId, full: bool) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.has_room = !full;
        }
    }

    /// The map.
    #[must_use]
    pub const fn world(&self) -> &SandboxWorld {
        &self.world
    }

    /// The map, for editing.
    pub fn world_mut(&mut self) -> &mut SandboxWorld {
        &mut self.world
    }

    /// Every side effect so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Takes the recorded side effects.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Throws queued for an actor, oldest first.
    #[must_use]
    pub fn queued_throws(&self, actor: ActorId) -> &[ThrowParameters] {
        self.actors
            .get(&actor)
            .map_or(&[], |entry| entry.queued.as_slice())
    }

    /// Current attack target of an actor.
    #[must_use]
    pub fn attack_target(&self, actor: ActorId) -> Option<ActorId> {
        self.actors.get(&actor).and_then(|entry| entry.attack_target)
    }

    /// Items an actor has caught.
    #[must_use]
    pub fn inventory(&self, actor: ActorId) -> &[ThrownItem] {
        self.actors
            .get(&actor)
            .map_or(&[], |entry| entry.inventory.as_slice())
    }

    fn next_visual(&mut self) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl ActorRegistry for SandboxHost {
    fn actor(&self, id: ActorId) -> Option<ActorInfo> {
        self.actors.get(&id).map(|entry| entry.info)
    }

    fn actor_at(&self, grid: GridNo, level: u8) -> Option<ActorId> {
        self.actors
            .values()
            .find(|entry| entry.info.grid == grid && entry.info.level == level)
            .map(|entry| entry.info.id)
    }

    fn max_toss_range(&self, actor: ActorId, _item: &ThrownItem, _armed: bool) -> u16 {
        self.actors.get(&actor).map_or(0, |entry| entry.toss_range)
    }

    fn set_attack_target(&mut self, actor: ActorId, target: Option<ActorId>) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.attack_target = target;
        }
        self.events.push(HostEvent::AttackTarget(actor, target));
    }

    fn queue_throw(&mut self, actor: ActorId, params: ThrowParameters) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.queued.push(params);
        }
        self.events.push(HostEvent::ThrowQueued(actor));
    }

    fn begin_catch(&mut self, actor: ActorId) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.info.catching = true;
        }
        self.events.push(HostEvent::CatchStarted(actor));
    }

    fn end_catch(&mut self, actor: ActorId) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.info.catching = false;
        }
        self.events.push(HostEvent::CatchEnded(actor));
    }

    fn take_item(&mut self, actor: ActorId, item: &ThrownItem) -> bool {
        let Some(entry) = self.actors.get_mut(&actor) else {
            return false;
        };
        if !entry.has_room {
            return false;
        }
        entry.inventory.push(item.clone());
        self.events.push(HostEvent::ItemTaken(actor, item.id()));
        true
    }

    fn struck_by_object(&mut self, actor: ActorId, owner: Option<ActorId>) {
        self.events.push(HostEvent::Struck(actor, owner));
    }

    fn curse(&mut self, actor: ActorId) {
        self.events.push(HostEvent::Cursed(actor));
    }

    fn attack_resolved(&mut self, actor: ActorId) {
        self.events.push(HostEvent::AttackResolved(actor));
    }
}

impl ItemPool for SandboxHost {
    fn add_item(
        &mut self,
        grid: GridNo,
        level: u8,
        item: &ThrownItem,
        visibility: Visibility,
        armed_bomb: bool,
    ) {
        self.events.push(HostEvent::ItemAdded {
            grid,
            level,
            item: item.id(),
            visibility,
            armed_bomb,
        });
    }

    fn notify_item_watchers(&mut self) {
        self.events.push(HostEvent::ItemWatchersNotified);
    }
}

impl Renderer for SandboxHost {
    fn attach_sprite(&mut self, grid: GridNo, _tile: u16) -> VisualHandle {
        let handle = self.next_visual();
        self.events.push(HostEvent::SpriteAttached(handle, grid));
        handle
    }

    fn attach_shadow(&mut self, grid: GridNo, _tile: u16) -> VisualHandle {
        let handle = self.next_visual();
        self.events.push(HostEvent::ShadowAttached(handle, grid));
        handle
    }

    fn place(&mut self, handle: VisualHandle, at: ScreenOffset) {
        self.events.push(HostEvent::Placed(handle, at));
    }

    fn hide(&mut self, handle: VisualHandle) {
        self.events.push(HostEvent::Hidden(handle));
    }

    fn detach(&mut self, handle: VisualHandle) {
        self.events.push(HostEvent::Detached(handle));
    }

    fn spawn_effect(&mut self, effect: Effect) {
        self.events.push(HostEvent::Effect(effect));
    }
}

impl Audio for SandboxHost {
    fn play_at(&mut self, grid: GridNo, sound: SoundEffect) {
        self.events.push(HostEvent::SoundAt(grid, sound));
    }

    fn play(&mut self, sound: SoundEffect) -> SoundHandle {
        let handle = SoundHandle(self.next_handle);
        self.next_handle += 1;
        self.events.push(HostEvent::SoundStarted(sound));
        handle
    }

    fn stop(&mut self, handle: SoundHandle) {
        self.events.push(HostEvent::SoundStopped(handle));
    }

    fn make_noise(&mut self, owner: Option<ActorId>, grid: GridNo, volume: u8, kind: NoiseKind) {
        self.events.push(HostEvent::Noise {
            owner,
            grid,
            volume,
            kind,
        });
    }
}

impl Ordnance for SandboxHost {
    fn ignite_explosion(&mut self, detonation: Detonation) {
        self.events.push(HostEvent::Explosion(detonation));
    }

    fn light_flare(&mut self, grid: GridNo) {
        self.events.push(HostEvent::Flare(grid));
    }

    fn window_hit(&mut self, grid: GridNo, _obstacle: Obstacle) {
        self.events.push(HostEvent::WindowHit(grid));
    }
}

impl Host for SandboxHost {
    fn geometry(&self) -> &dyn WorldGeometry {
        &self.world
    }

    fn rng(&mut self) -> &mut dyn RandomSource {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_ground_hit() {
        let world = SandboxWorld::new(GridGeometry::STANDARD);
        let hit = world
            .check_collision(Vec3::new(55.0, 55.0, -1.0), Vec3::new(1.0, 0.0, -2.0))
            .expect("ground");
        assert_eq!(hit.kind, CollisionKind::Ground);
        assert_eq!(world.query_count(), 1);
        assert!(world
            .check_collision(Vec3::new(55.0, 55.0, 10.0), Vec3::new(1.0, 0.0, -2.0))
            .is_none());
    }

    #[test]
    fn test_roof_from_above_and_below() {
        let grid = GridGeometry::STANDARD;
        let cell = grid.grid_no(5, 5).expect("cell");
        let mut world = SandboxWorld::new(grid);
        world.set_roof(cell);

        let from_above = world
            .check_collision(Vec3::new(55.0, 55.0, 250.0), Vec3::new(0.0, 0.0, -10.0))
            .expect("roof");
        assert_eq!(from_above.kind, CollisionKind::Roof);

        let from_below = world
            .check_collision(Vec3::new(55.0, 55.0, 260.0), Vec3::new(0.0, 0.0, 10.0))
            .expect("ceiling");
        assert_eq!(from_below.kind, CollisionKind::InteriorRoof);
    }

    #[test]
    fn test_structure_side_and_top() {
        let grid = GridGeometry::STANDARD;
        let cell = grid.grid_no(5, 5).expect("cell");
        let mut world = SandboxWorld::new(grid);
        world.set_structure(cell, StructureId::new(1), 100.0);

        let side = world
            .check_collision(Vec3::new(51.0, 55.0, 50.0), Vec3::new(2.0, 0.0, 0.0))
            .expect("side");
        assert_eq!(side.kind, CollisionKind::Structure);
        assert_eq!(side.obstacle, Obstacle::Structure(StructureId::new(1)));

        let top = world
            .check_collision(Vec3::new(55.0, 55.0, 99.0), Vec3::new(0.0, 0.0, -2.0))
            .expect("top");
        assert_eq!(top.kind, CollisionKind::StructureZ);
    }

    #[test]
    fn test_window_between() {
        let grid = GridGeometry::STANDARD;
        let mut world = SandboxWorld::new(grid);
        let window = grid.grid_no(10, 5).expect("cell");
        world.set_window(window, Facing::SouthEast);

        let from = grid.grid_no(5, 5).expect("cell");
        let to = grid.grid_no(15, 5).expect("cell");
        assert_eq!(world.window_between(from, to), Some(window));

        let elsewhere = grid.grid_no(15, 9).expect("cell");
        assert_eq!(world.window_between(from, elsewhere), None);
    }

    #[test]
    fn test_host_records_actor_reactions() {
        let grid = GridGeometry::STANDARD;
        let mut host = SandboxHost::new(SandboxWorld::new(grid), 1);
        let cell = grid.grid_no(3, 3).expect("cell");
        let actor = host.add_actor(cell, 0, Stance::Crouched, 50);

        assert_eq!(host.actor_at(cell, 0), Some(actor));
        assert_eq!(host.actor_at(cell, 1), None);

        host.begin_catch(actor);
        assert!(host.actor(actor).expect("actor").catching);
        host.end_catch(actor);
        assert!(!host.actor(actor).expect("actor").catching);

        host.set_inventory_full(actor, true);
        assert!(!host.take_item(actor, &sample_item(ItemKind::Rock)));
        host.set_inventory_full(actor, false);
        assert!(host.take_item(actor, &sample_item(ItemKind::Rock)));
        assert_eq!(host.inventory(actor).len(), 1);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = SandboxCatalog::standard();
        let grenade = ThrownItem::from_catalog(&catalog, ItemTypeId::new(2), 80)
            .expect("grenade is catalogued");
        assert!(grenade.is_grenade());
        assert!(ThrownItem::from_catalog(&catalog, ItemTypeId::new(99), 80).is_err());
    }
}
