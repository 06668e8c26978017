use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::{
    connection::Database, helpers::normalize_player_id, models::ReportSummary,
    repositories::players::ensure_player,
};
use crate::report::SessionReport;

fn parse_payload(payload: &str) -> Result<SessionReport> {
    serde_json::from_str(payload).context("failed to decode stored session report")
}

impl Database {
    /// Append a finished session to the player's history, creating the
    /// player on first save.
    pub async fn save_report(&self, player_id: &str, report: &SessionReport) -> Result<()> {
        let player_id = normalize_player_id(player_id)?;
        let mut record = report.clone();
        record.player_id = player_id.clone();
        let payload = serde_json::to_string(&record).context("failed to encode session report")?;

        self.execute(move |conn| {
            let tx = conn.transaction()?;
            ensure_player(&tx, &player_id)?;
            tx.execute(
                "INSERT INTO session_reports (id, player_id, game, timestamp, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    player_id,
                    record.game,
                    record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                    payload,
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                ],
            )
            .with_context(|| "failed to insert session report")?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Every saved session of `player_id`, newest first.
    pub async fn load_sessions(&self, player_id: &str) -> Result<Vec<SessionReport>> {
        let player_id = normalize_player_id(player_id)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT payload FROM session_reports
                 WHERE player_id = ?1
                 ORDER BY timestamp DESC, created_at DESC",
            )?;
            let mut rows = stmt.query(params![player_id])?;
            let mut reports = Vec::new();
            while let Some(row) = rows.next()? {
                let payload: String = row.get(0)?;
                reports.push(parse_payload(&payload)?);
            }
            Ok(reports)
        })
        .await
    }

    pub async fn list_report_summaries(&self, player_id: &str) -> Result<Vec<ReportSummary>> {
        Ok(self
            .load_sessions(player_id)
            .await?
            .into_iter()
            .map(|report| ReportSummary {
                id: report.id,
                player_id: report.player_id,
                game: report.game,
                kind: report.kind,
                score: report.score,
                timestamp: report.timestamp,
            })
            .collect())
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Option<SessionReport>> {
        let report_id = report_id.to_string();
        self.execute(move |conn| {
            let payload: Option<String> = conn
                .query_row(
                    "SELECT payload FROM session_reports WHERE id = ?1",
                    params![report_id],
                    |row| row.get(0),
                )
                .optional()?;
            payload.as_deref().map(parse_payload).transpose()
        })
        .await
    }

    /// Returns false when no report had that id.
    pub async fn delete_report(&self, report_id: &str) -> Result<bool> {
        let report_id = report_id.to_string();
        self.execute(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM session_reports WHERE id = ?1",
                params![report_id],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}
