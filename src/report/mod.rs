//! Final results of a game: result rows, per-game details, advice, and the
//! write-once report handed to storage.

mod table;

pub use table::ResultsTable;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{GameKind, Phase, PhaseScores};
use crate::metrics::{Metric, MetricsSummary, SymmetrySummary};
use crate::settings::Level;

/// Star game: one row per phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRow {
    pub phase: Phase,
    pub stars: u32,
    pub right_angle: Metric,
    pub left_angle: Metric,
    pub right_range: Metric,
    pub left_range: Metric,
}

/// Balloon game: one row per collected cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRow {
    pub cloud: u32,
    pub attempts: u32,
    pub stability: u32,
}

/// Obstacle game: one row per resolved obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleRow {
    pub obstacle: u32,
    pub passed: bool,
    pub min_knee_angle: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResultRow {
    Phase(PhaseRow),
    Cloud(CloudRow),
    Obstacle(ObstacleRow),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "camelCase")]
pub enum GameDetails {
    #[serde(rename_all = "camelCase")]
    Star {
        level: Level,
        duration_secs: u32,
        phase_scores: PhaseScores,
        metrics: MetricsSummary,
    },
    #[serde(rename_all = "camelCase")]
    Balloon {
        cloud_count: u32,
        symmetry: SymmetrySummary,
    },
    #[serde(rename_all = "camelCase")]
    Obstacle { obstacle_count: u32, failed: u32 },
}

/// What a simulation hands back when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOutcome {
    pub kind: GameKind,
    pub score: i64,
    pub rows: Vec<ResultRow>,
    pub details: GameDetails,
    pub advice: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub player_id: String,
    pub game: String,
    pub kind: GameKind,
    pub score: i64,
    pub rows: Vec<ResultRow>,
    pub details: GameDetails,
    pub advice: Vec<String>,
}

impl SessionReport {
    pub fn assemble(player_id: &str, outcome: &GameOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            player_id: player_id.to_string(),
            game: outcome.kind.display_name().to_string(),
            kind: outcome.kind,
            score: outcome.score,
            rows: outcome.rows.clone(),
            details: outcome.details.clone(),
            advice: outcome.advice.clone(),
        }
    }

    pub fn table(&self) -> ResultsTable {
        ResultsTable::from_rows(&self.rows, &self.advice)
    }
}
