//! The item carried by a physical object.

use lobber_common::ItemTypeId;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};
use crate::host::ItemCatalog;

/// Launcher families that change how a shot is aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LauncherKind {
    /// Indirect-fire mortar tube
    Mortar,
    /// Stand-alone grenade launcher
    GrenadeLauncher,
    /// Under-barrel grenade launcher
    UnderbarrelLauncher,
}

/// Behavioural family of an item once it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Rocks make a rock-impact noise
    Rock,
    /// Hand grenades and launcher grenades
    Grenade,
    /// Mortar shells detonate on impact
    MortarShell,
    /// Chemical light that turns into a flare
    BreakLight,
    /// A launcher itself
    Launcher(LauncherKind),
    /// Anything else
    Other,
}

/// Catalog entry for an item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescription {
    /// Item type
    pub id: ItemTypeId,
    /// Short display name
    pub name: String,
    /// Behavioural family
    pub kind: ItemKind,
    /// Lost when it lands in water
    pub sinks: bool,
    /// Designed to be thrown by hand
    pub thrown: bool,
    /// Sprite tile used while flying
    pub tile: u16,
    /// Launcher that fires this item, if any
    pub fired_by: Option<LauncherKind>,
}

/// Fuse state of an armed item left in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Detonator {
    /// Not armed
    #[default]
    None,
    /// Goes off after a number of turns
    Timed {
        /// Turns until detonation
        delay: u8,
    },
}

/// Copy of the item an object carries through the air.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrownItem {
    /// Catalog entry
    pub description: ItemDescription,
    /// Condition, 0-100
    pub status: u8,
    /// Fuse state
    pub detonator: Detonator,
}

impl ThrownItem {
    /// Creates an item in the given condition.
    #[must_use]
    pub fn new(description: ItemDescription, status: u8) -> Self {
        Self {
            description,
            status: status.min(100),
            detonator: Detonator::None,
        }
    }

    /// Looks an item type up in a catalog.
    pub fn from_catalog(
        catalog: &dyn ItemCatalog,
        id: ItemTypeId,
        status: u8,
    ) -> PhysicsResult<Self> {
        catalog
            .describe(id)
            .map(|description| Self::new(description, status))
            .ok_or(PhysicsError::UnknownItem(id))
    }

    /// Item type.
    #[must_use]
    pub const fn id(&self) -> ItemTypeId {
        self.description.id
    }

    /// Behavioural family.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.description.kind
    }

    /// Launcher class that governs aiming: the launcher itself, or the
    /// launcher that fires this round.
    #[must_use]
    pub fn launcher_class(&self) -> Option<LauncherKind> {
        match self.description.kind {
            ItemKind::Launcher(kind) => Some(kind),
            _ => self.description.fired_by,
        }
    }

    /// Returns true for mortar shells.
    #[must_use]
    pub fn is_mortar_shell(&self) -> bool {
        self.description.kind == ItemKind::MortarShell
    }

    /// Returns true for grenades.
    #[must_use]
    pub fn is_grenade(&self) -> bool {
        self.description.kind == ItemKind::Grenade
    }

    /// Mortar shells go off on their first real collision.
    #[must_use]
    pub fn detonates_on_impact(&self) -> bool {
        self.is_mortar_shell()
    }
}
