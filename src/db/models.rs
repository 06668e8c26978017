use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::GameKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Listing entry for a saved session, without the full payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub player_id: String,
    pub game: String,
    pub kind: GameKind,
    pub score: i64,
    pub timestamp: DateTime<Utc>,
}
