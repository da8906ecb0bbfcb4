//! Collaborator contracts.
//!
//! The physics core never owns the map, the actors, the item pool, the
//! renderer or the sound system. It reaches them through the narrow traits
//! below. Read-only world queries are split into [`WorldGeometry`] so that
//! probe simulations can be handed nothing else; everything with side
//! effects hangs off [`Host`].

use glam::Vec3;
use lobber_common::{ActorId, GridGeometry, GridNo, ItemTypeId};
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionHit, Obstacle};
use crate::item::{ItemDescription, ThrownItem};
use crate::launch::ThrowParameters;

/// Opaque handle to a sprite or shadow node owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// Opaque handle to a playing sound owned by the audio system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundHandle(pub u32);

/// Pixel-space placement of a node relative to the map origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenOffset {
    /// Horizontal world x
    pub x: i32,
    /// Horizontal world y
    pub y: i32,
    /// Height in pixels
    pub z: i32,
}

/// Body posture of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Upright
    Standing,
    /// Kneeling
    Crouched,
    /// Lying down
    Prone,
}

/// What the physics core needs to know about an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorInfo {
    /// Actor id
    pub id: ActorId,
    /// Cell the actor stands in
    pub grid: GridNo,
    /// Building level (0 = ground)
    pub level: u8,
    /// Current posture
    pub stance: Stance,
    /// Effective dexterity, 0-100
    pub dexterity: u8,
    /// Already playing a catch (or rifle-lowering) animation
    pub catching: bool,
}

/// Whether an item dropped into the world can be seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Shown to everyone
    Visible,
    /// Hidden until discovered
    Hidden,
}

/// Sound samples triggered by flying objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Object thudding into the ground
    ThrowImpact,
    /// Actor catching an object
    CatchObject,
    /// Falling mortar shell
    MortarWhistle,
}

/// Kinds of noise other actors can hear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseKind {
    /// A rock landing
    RockImpact,
    /// A grenade landing
    GrenadeImpact,
}

/// Transient animated effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Splash where an object entered water
    Ripple {
        /// Cell of the splash
        grid: GridNo,
        /// Exact placement
        at: ScreenOffset,
        /// The splash ends in an underwater explosion
        chained_explosion: bool,
    },
    /// Puff left behind by a mortar shell
    SmokeTrail {
        /// Cell of the puff
        grid: GridNo,
        /// Exact placement
        at: ScreenOffset,
        /// Frame delay in milliseconds
        delay_ms: u16,
    },
}

/// Everything an explosion needs to know about the shell that caused it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detonation {
    /// Actor that launched the object
    pub owner: Option<ActorId>,
    /// World position of the blast
    pub position: Vec3,
    /// Blast height in pixels
    pub z_pixels: i32,
    /// Cell of the blast
    pub grid: GridNo,
    /// Explosive item type
    pub item: ItemTypeId,
    /// Building level of the blast
    pub level: u8,
}

/// Read-only map queries.
pub trait WorldGeometry {
    /// Map dimensions.
    fn grid(&self) -> GridGeometry;

    /// Classifies the segment that ends at `position` after moving by
    /// `delta`. Returns `None` if nothing was crossed.
    fn check_collision(&self, position: Vec3, delta: Vec3) -> Option<CollisionHit>;

    /// Land surface height of a cell, in height units.
    fn land_height(&self, grid: GridNo) -> f32;

    /// Returns true if the cell is part of the playable (visible) map.
    fn is_visible_tile(&self, grid: GridNo) -> bool;

    /// Returns true if a roof covers the cell.
    fn has_roof(&self, grid: GridNo) -> bool;

    /// Returns true for cave and basement maps.
    fn is_underground(&self) -> bool;

    /// First window cell on the line between two cells, if any.
    fn window_between(&self, from: GridNo, to: GridNo) -> Option<GridNo>;
}

/// Actor lookup and actor-side reactions.
pub trait ActorRegistry {
    /// Resolves an actor id.
    fn actor(&self, id: ActorId) -> Option<ActorInfo>;

    /// Actor standing at a cell and level.
    fn actor_at(&self, grid: GridNo, level: u8) -> Option<ActorId>;

    /// Farthest toss, in cells, the actor manages with this item.
    fn max_toss_range(&self, actor: ActorId, item: &ThrownItem, armed: bool) -> u16;

    /// Records who the actor is aiming at.
    fn set_attack_target(&mut self, actor: ActorId, target: Option<ActorId>);

    /// Stores a computed throw until the actor's animation releases it.
    fn queue_throw(&mut self, actor: ActorId, params: ThrowParameters);

    /// Starts the catch animation.
    fn begin_catch(&mut self, actor: ActorId);

    /// Ends the catch animation.
    fn end_catch(&mut self, actor: ActorId);

    /// Moves an item into the actor's inventory. Returns false if it did
    /// not fit.
    fn take_item(&mut self, actor: ActorId, item: &ThrownItem) -> bool;

    /// The actor was struck by a flying object.
    fn struck_by_object(&mut self, actor: ActorId, owner: Option<ActorId>);

    /// The actor swears (their grenade was a dud).
    fn curse(&mut self, actor: ActorId);

    /// The actor's pending attack has finished.
    fn attack_resolved(&mut self, actor: ActorId);
}

/// Item descriptions by type.
pub trait ItemCatalog {
    /// Looks up an item type.
    fn describe(&self, id: ItemTypeId) -> Option<ItemDescription>;
}

/// The world's pool of items lying on the ground.
pub trait ItemPool {
    /// Drops an item at a cell.
    fn add_item(
        &mut self,
        grid: GridNo,
        level: u8,
        item: &ThrownItem,
        visibility: Visibility,
        armed_bomb: bool,
    );

    /// Tells everyone to look around for newly dropped items.
    fn notify_item_watchers(&mut self);
}

/// Sprite attachment and transient effects.
pub trait Renderer {
    /// Attaches an object sprite to a cell.
    fn attach_sprite(&mut self, grid: GridNo, tile: u16) -> VisualHandle;

    /// Attaches an object shadow to a cell.
    fn attach_shadow(&mut self, grid: GridNo, tile: u16) -> VisualHandle;

    /// Moves a node.
    fn place(&mut self, handle: VisualHandle, at: ScreenOffset);

    /// Hides a node without detaching it.
    fn hide(&mut self, handle: VisualHandle);

    /// Detaches and frees a node.
    fn detach(&mut self, handle: VisualHandle);

    /// Starts a one-shot animation.
    fn spawn_effect(&mut self, effect: Effect);
}

/// Sound playback and audible noise.
pub trait Audio {
    /// Plays a one-shot sample at a cell.
    fn play_at(&mut self, grid: GridNo, sound: SoundEffect);

    /// Starts a sample and returns its handle.
    fn play(&mut self, sound: SoundEffect) -> SoundHandle;

    /// Stops a sample.
    fn stop(&mut self, handle: SoundHandle);

    /// Makes a noise other actors can react to.
    fn make_noise(&mut self, owner: Option<ActorId>, grid: GridNo, volume: u8, kind: NoiseKind);
}

/// Explosions, flares and breakable windows.
pub trait Ordnance {
    /// Detonates an explosive.
    fn ignite_explosion(&mut self, detonation: Detonation);

    /// Lights a flare on the ground.
    fn light_flare(&mut self, grid: GridNo);

    /// Breaks the window an object flew through.
    fn window_hit(&mut self, grid: GridNo, obstacle: Obstacle);
}

/// Uniform random draws.
pub trait RandomSource {
    /// Uniform integer in `0..n` (0 when `n == 0`).
    fn below(&mut self, n: u32) -> u32;

    /// Returns true with the given percent probability.
    fn chance(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }
}

impl RandomSource for fastrand::Rng {
    fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.u32(0..n)
        }
    }
}

/// Everything a live simulation may touch.
pub trait Host: ActorRegistry + ItemPool + Renderer + Audio + Ordnance {
    /// Map queries.
    fn geometry(&self) -> &dyn WorldGeometry;

    /// Random source for dispersion, catches and dud rolls.
    fn rng(&mut self) -> &mut dyn RandomSource;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = fastrand::Rng::with_seed(7);
        let mut b = fastrand::Rng::with_seed(7);
        for _ in 0..32 {
            assert_eq!(a.below(100), b.below(100));
        }
    }

    #[test]
    fn test_below_zero_is_zero() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(rng.below(0), 0);
        assert!(!rng.chance(0));
        assert!(rng.chance(100));
    }
}
