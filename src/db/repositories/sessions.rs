use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::app::ports::SessionRepository;
use crate::db::{helpers::parse_datetime, Database};
use crate::domain::{BeatSpec, FrequencyValue};
use crate::models::Session;

const SELECT_COLUMNS: &str = "SELECT id, label, left_hz, right_hz, created_at FROM sessions";

fn row_to_session(row: &Row) -> Result<Session> {
    let id: String = row.get("id")?;
    let left_hz: f64 = row.get("left_hz")?;
    let right_hz: f64 = row.get("right_hz")?;
    let created_at: String = row.get("created_at")?;

    let beat = BeatSpec::with_created_at(
        FrequencyValue::from_hz(left_hz)?,
        FrequencyValue::from_hz(right_hz)?,
        parse_datetime(&created_at, "created_at")?,
    )
    .with_context(|| format!("stored session {id} no longer validates"))?;

    Ok(Session {
        id,
        label: row.get("label")?,
        beat,
    })
}

impl SessionRepository for Database {
    async fn save(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, label, left_hz, right_hz, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     label = excluded.label,
                     left_hz = excluded.left_hz,
                     right_hz = excluded.right_hz,
                     created_at = excluded.created_at,
                     updated_at = excluded.updated_at",
                params![
                    record.id,
                    record.label,
                    record.beat.left().hz(),
                    record.beat.right().hz(),
                    record.beat.created_at().to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to save session")?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let id = id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            stmt.query_row(params![id], |row| Ok(row_to_session(row)))
                .optional()?
                .transpose()
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Session>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY seq ASC"))?;
            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM sessions WHERE id = ?1", params![id])
                .context("failed to delete session")?;
            Ok(removed > 0)
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM sessions", [])
                .context("failed to clear sessions")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, left: f64, right: f64) -> Session {
        Session::new(id, None, BeatSpec::from_hz(left, right).unwrap())
    }

    #[tokio::test]
    async fn upsert_keeps_original_position() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("simbeat.db")).unwrap();

        db.save(&session("a", 220.0, 230.0)).await.unwrap();
        db.save(&session("b", 200.0, 206.0)).await.unwrap();
        db.save(&session("a", 180.0, 182.0)).await.unwrap();

        let sessions = db.list().await.unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(sessions[0].beat.left().hz(), 180.0);
    }

    #[tokio::test]
    async fn rejects_rows_that_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("simbeat.db")).unwrap();

        db.execute(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, label, left_hz, right_hz, created_at, updated_at)
                 VALUES ('bad', NULL, 220.0, 220.0, ?1, ?1)",
                params![Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        assert!(db.find_by_id("bad").await.is_err());
    }
}
