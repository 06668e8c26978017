use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{normalize_player_id, parse_datetime},
    models::Player,
};

fn row_to_player(row: &Row) -> Result<Player> {
    let created_at: String = row.get("created_at")?;
    Ok(Player {
        id: row.get("id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

/// Insert the player row unless it already exists. Runs inside the caller's
/// DB task so report inserts never race player creation.
pub(crate) fn ensure_player(conn: &Connection, player_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO players (id, created_at) VALUES (?1, ?2)",
        params![
            player_id,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ],
    )?;
    Ok(())
}

impl Database {
    /// Whether a player with this id has ever been registered.
    pub async fn check_exists(&self, key: &str) -> Result<bool> {
        let key = key.trim().to_string();
        if key.is_empty() {
            return Ok(false);
        }
        self.execute(move |conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM players WHERE id = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    pub async fn register_player(&self, player_id: &str) -> Result<Player> {
        let player_id = normalize_player_id(player_id)?;
        self.execute(move |conn| {
            ensure_player(conn, &player_id)?;
            let mut stmt = conn.prepare("SELECT id, created_at FROM players WHERE id = ?1")?;
            let mut rows = stmt.query(params![player_id])?;
            let player = match rows.next()? {
                Some(row) => row_to_player(row)?,
                None => bail!("player {player_id} missing after insert"),
            };
            Ok(player)
        })
        .await
    }

    pub async fn list_players(&self) -> Result<Vec<Player>> {
        self.execute(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, created_at FROM players ORDER BY created_at ASC, id ASC")?;
            let mut rows = stmt.query([])?;
            let mut players = Vec::new();
            while let Some(row) = rows.next()? {
                players.push(row_to_player(row)?);
            }
            Ok(players)
        })
        .await
    }
}
