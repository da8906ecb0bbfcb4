//! Simulator configuration.
//!
//! One TOML file carries the physics tuning and the scenario to run: the
//! map, the thrower, the target and the item.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use lobber_physics::{ActionCode, ItemKind, PhysicsConfig, Stance};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "lobber.toml";

/// An actor placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSpec {
    /// Column
    pub col: i32,
    /// Row
    pub row: i32,
    /// Building level
    pub level: u8,
    /// Posture
    pub stance: Stance,
    /// Dexterity, 0-100
    pub dexterity: u8,
    /// Longest toss in cells
    pub toss_range: u16,
}

impl Default for ActorSpec {
    fn default() -> Self {
        Self {
            col: 40,
            row: 40,
            level: 0,
            stance: Stance::Standing,
            dexterity: 70,
            toss_range: 20,
        }
    }
}

/// A tall obstacle on one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    /// Column
    pub col: i32,
    /// Row
    pub row: i32,
    /// Height above the land surface
    pub height: f32,
}

/// The throw to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Map columns
    pub cols: u32,
    /// Map rows
    pub rows: u32,
    /// Random seed
    pub seed: u64,
    /// Throwing actor
    pub thrower: ActorSpec,
    /// Actor expected to catch the item, if any
    pub catcher: Option<ActorSpec>,
    /// Target column
    pub target_col: i32,
    /// Target row
    pub target_row: i32,
    /// Target level
    pub target_level: u8,
    /// Target height above the floor
    pub target_height: f32,
    /// Item family to throw
    pub item: ItemKind,
    /// Item condition, 0-100
    pub item_status: u8,
    /// Arrival behaviour
    pub action: ActionCode,
    /// Dispersion, 0 for a perfect throw
    pub miss_by: i8,
    /// Roofed cells
    pub roofs: Vec<[i32; 2]>,
    /// Water cells
    pub water: Vec<[i32; 2]>,
    /// Tall obstacles
    pub structures: Vec<StructureSpec>,
    /// Give up after this many ticks
    pub max_ticks: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            cols: 160,
            rows: 160,
            seed: 1,
            thrower: ActorSpec::default(),
            catcher: None,
            target_col: 50,
            target_row: 40,
            target_level: 0,
            target_height: 0.0,
            item: ItemKind::Grenade,
            item_status: 100,
            action: ActionCode::ArmedThrow,
            miss_by: 0,
            roofs: Vec::new(),
            water: Vec::new(),
            structures: Vec::new(),
            max_ticks: 10_000,
        }
    }
}

impl ScenarioConfig {
    fn validate(&mut self) {
        self.cols = self.cols.clamp(1, 1024);
        self.rows = self.rows.clamp(1, 1024);
        self.item_status = self.item_status.min(100);
        self.thrower.dexterity = self.thrower.dexterity.min(100);
        if let Some(catcher) = &mut self.catcher {
            catcher.dexterity = catcher.dexterity.min(100);
        }
        self.max_ticks = self.max_ticks.clamp(1, 1_000_000);
    }
}

/// Simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Physics tuning
    pub physics: PhysicsConfig,
    /// Scenario to run
    pub scenario: ScenarioConfig,
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        config.validate();
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.physics.validate();
        self.scenario.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.physics.pool_capacity, 50);
        assert_eq!(config.scenario.item, ItemKind::Grenade);
        assert_eq!(config.scenario.action, ActionCode::ArmedThrow);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.scenario.item_status = 250;
        config.scenario.max_ticks = 0;
        config.physics.substeps = 0;

        config.validate();

        assert_eq!(config.scenario.item_status, 100);
        assert_eq!(config.scenario.max_ticks, 1);
        assert_eq!(config.physics.substeps, 1);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("scenarios").join(CONFIG_FILE);

        let mut config = SimConfig::default();
        config.scenario.item = ItemKind::MortarShell;
        config.scenario.thrower.stance = Stance::Prone;
        config.scenario.water.push([12, 13]);
        config.physics.gravity = 30.0;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded.scenario.item, ItemKind::MortarShell);
        assert_eq!(loaded.scenario.thrower.stance, Stance::Prone);
        assert_eq!(loaded.scenario.water, vec![[12, 13]]);
        assert!((loaded.physics.gravity - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(
            &config_path,
            "[scenario]\ntarget_col = 70\nitem = \"Rock\"\naction = \"FreeFall\"\n",
        )
        .expect("write config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded.scenario.target_col, 70);
        assert_eq!(loaded.scenario.item, ItemKind::Rock);
        assert_eq!(loaded.scenario.target_row, 40);
        assert_eq!(loaded.physics, PhysicsConfig::default());
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/lobber.toml");
        assert_eq!(config, SimConfig::default());
    }
}
