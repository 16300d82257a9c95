//! SQLite persistence through sqlx.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use langdrill_core::error::StoreError;
use langdrill_core::model::{Attempt, ExerciseKind, Progress};
use langdrill_core::traits::ProgressStore;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS attempts (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        exercise TEXT NOT NULL,
        item_id TEXT,
        correct INTEGER NOT NULL,
        latency_ms INTEGER,
        difficulty_level INTEGER,
        ts TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_attempts_user_exercise ON attempts (user_id, exercise)",
    "CREATE TABLE IF NOT EXISTS progress (
        user_id TEXT NOT NULL,
        exercise TEXT NOT NULL,
        level INTEGER NOT NULL,
        ema_accuracy REAL NOT NULL,
        ema_latency_ms REAL NOT NULL,
        attempts INTEGER NOT NULL,
        streak INTEGER NOT NULL,
        last_updated TEXT NOT NULL,
        PRIMARY KEY (user_id, exercise)
    )",
];

fn query_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(e.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

/// SQLite-backed [`ProgressStore`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid database url {url}: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));

        // Every connection to `:memory:` is a separate database.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await
        }
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url, "progress store ready");
        Ok(store)
    }

    /// A private in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(query_err)?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_exercise(raw: &str) -> Result<ExerciseKind, StoreError> {
    raw.parse()
        .map_err(|e: String| StoreError::Corrupt(format!("exercise column: {e}")))
}

fn narrow<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T, StoreError> {
    T::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn progress_from_row(row: &SqliteRow) -> Result<Progress, StoreError> {
    let exercise: String = row.try_get("exercise").map_err(query_err)?;
    Ok(Progress {
        user_id: row.try_get("user_id").map_err(query_err)?,
        exercise: parse_exercise(&exercise)?,
        level: narrow(row.try_get("level").map_err(query_err)?, "level")?,
        ema_accuracy: row.try_get("ema_accuracy").map_err(query_err)?,
        ema_latency_ms: row.try_get("ema_latency_ms").map_err(query_err)?,
        attempts: narrow(row.try_get("attempts").map_err(query_err)?, "attempts")?,
        streak: narrow(row.try_get("streak").map_err(query_err)?, "streak")?,
        last_updated: row
            .try_get::<DateTime<Utc>, _>("last_updated")
            .map_err(query_err)?,
    })
}

fn attempt_from_row(row: &SqliteRow) -> Result<Attempt, StoreError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let exercise: String = row.try_get("exercise").map_err(query_err)?;
    let latency: Option<i64> = row.try_get("latency_ms").map_err(query_err)?;
    let difficulty: Option<i64> = row.try_get("difficulty_level").map_err(query_err)?;
    Ok(Attempt {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::Corrupt(format!("attempt id: {e}")))?,
        user_id: row.try_get("user_id").map_err(query_err)?,
        exercise: parse_exercise(&exercise)?,
        item_id: row.try_get("item_id").map_err(query_err)?,
        correct: row.try_get("correct").map_err(query_err)?,
        latency_ms: latency.map(|v| narrow(v, "latency_ms")).transpose()?,
        difficulty_level: difficulty
            .map(|v| narrow(v, "difficulty_level"))
            .transpose()?,
        ts: row.try_get::<DateTime<Utc>, _>("ts").map_err(query_err)?,
    })
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn load_or_init(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Progress, StoreError> {
        let fresh = Progress::new(user_id, exercise, Utc::now());
        sqlx::query(
            "INSERT INTO progress
                (user_id, exercise, level, ema_accuracy, ema_latency_ms, attempts, streak, last_updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, exercise) DO NOTHING",
        )
        .bind(&fresh.user_id)
        .bind(exercise.as_str())
        .bind(i64::from(fresh.level))
        .bind(fresh.ema_accuracy)
        .bind(fresh.ema_latency_ms)
        .bind(i64::from(fresh.attempts))
        .bind(i64::from(fresh.streak))
        .bind(fresh.last_updated)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        self.get(user_id, exercise)
            .await?
            .ok_or_else(|| StoreError::Query(format!("progress row for {user_id}/{exercise} vanished")))
    }

    async fn get(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Option<Progress>, StoreError> {
        let row = sqlx::query("SELECT * FROM progress WHERE user_id = ? AND exercise = ?")
            .bind(user_id)
            .bind(exercise.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;
        row.as_ref().map(progress_from_row).transpose()
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        let rows = sqlx::query("SELECT * FROM progress WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        let mut records = rows
            .iter()
            .map(progress_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|p| p.exercise);
        Ok(records)
    }

    async fn commit_attempt(
        &self,
        attempt: &Attempt,
        progress: &Progress,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        sqlx::query(
            "INSERT INTO attempts
                (id, user_id, exercise, item_id, correct, latency_ms, difficulty_level, ts)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(attempt.id.to_string())
        .bind(&attempt.user_id)
        .bind(attempt.exercise.as_str())
        .bind(&attempt.item_id)
        .bind(attempt.correct)
        .bind(attempt.latency_ms.map(|v| v.min(i64::MAX as u64) as i64))
        .bind(attempt.difficulty_level.map(i64::from))
        .bind(attempt.ts)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        sqlx::query(
            "INSERT INTO progress
                (user_id, exercise, level, ema_accuracy, ema_latency_ms, attempts, streak, last_updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, exercise) DO UPDATE SET
                level = excluded.level,
                ema_accuracy = excluded.ema_accuracy,
                ema_latency_ms = excluded.ema_latency_ms,
                attempts = excluded.attempts,
                streak = excluded.streak,
                last_updated = excluded.last_updated",
        )
        .bind(&progress.user_id)
        .bind(progress.exercise.as_str())
        .bind(i64::from(progress.level))
        .bind(progress.ema_accuracy)
        .bind(progress.ema_latency_ms)
        .bind(i64::from(progress.attempts))
        .bind(i64::from(progress.streak))
        .bind(progress.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn list_attempts(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Vec<Attempt>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM attempts WHERE user_id = ? AND exercise = ? ORDER BY seq",
        )
        .bind(user_id)
        .bind(exercise.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;
        rows.iter().map(attempt_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_exercise_is_reported() {
        let store = SqliteStore::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO progress VALUES ('u1', 'juggling', 1, 0.0, 0.0, 0, 0, '2024-01-01T00:00:00Z')",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        let err = store.list_progress("u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn bad_url_is_unavailable() {
        let err = SqliteStore::connect("postgres://nope").await.err().unwrap();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
