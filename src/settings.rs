use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use log::warn;

use crate::pose::Canvas;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Default for Level {
    fn default() -> Self {
        Level::Medium
    }
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }

    /// Height the star capture line climbs to, as a fraction from the top.
    pub fn capture_line_floor(&self) -> f64 {
        match self {
            Level::Low => 0.35,
            Level::Medium => 0.25,
            Level::High => 0.15,
        }
    }
}

impl std::str::FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            other => bail!("unknown level '{other}'"),
        }
    }
}

pub const DURATION_CHOICES: [u32; 3] = [30, 60, 90];
pub const MAX_TARGETS: u32 = 20;

/// Options chosen before a game starts; read once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameOptions {
    pub level: Level,
    pub duration_secs: u32,
    pub cloud_count: u32,
    pub obstacle_count: u32,
    pub canvas: Canvas,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            level: Level::Medium,
            duration_secs: 30,
            cloud_count: 5,
            obstacle_count: 5,
            canvas: Canvas::default(),
        }
    }
}

impl GameOptions {
    pub fn validate(&self) -> Result<()> {
        if !DURATION_CHOICES.contains(&self.duration_secs) {
            bail!(
                "duration must be one of {:?} seconds, got {}",
                DURATION_CHOICES,
                self.duration_secs
            );
        }
        if !(1..=MAX_TARGETS).contains(&self.cloud_count) {
            bail!("cloud count must be between 1 and {MAX_TARGETS}, got {}", self.cloud_count);
        }
        if !(1..=MAX_TARGETS).contains(&self.obstacle_count) {
            bail!(
                "obstacle count must be between 1 and {MAX_TARGETS}, got {}",
                self.obstacle_count
            );
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            bail!("canvas must have a positive size");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    game_options: GameOptions,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings file {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn game_options(&self) -> GameOptions {
        match self.data.read() {
            Ok(guard) => guard.game_options.clone(),
            Err(poisoned) => poisoned.into_inner().game_options.clone(),
        }
    }

    pub fn update_game_options(&self, options: GameOptions) -> Result<()> {
        options.validate()?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.game_options = options;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
