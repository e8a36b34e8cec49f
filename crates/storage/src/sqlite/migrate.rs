use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Brings the schema up to the latest version.
///
/// Version 1 holds session records, their step snapshots, and the lookup
/// index used for history prefill. Version 2 adds named workout plans.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_records (
                    id INTEGER PRIMARY KEY,
                    run_id TEXT NOT NULL UNIQUE,
                    user_id TEXT NOT NULL,
                    session_id TEXT NOT NULL,
                    muscle_group TEXT NOT NULL,
                    session_name TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    total_duration_seconds INTEGER NOT NULL CHECK (total_duration_seconds >= 0),
                    max_weight_kg REAL CHECK (max_weight_kg IS NULL OR max_weight_kg > 0),
                    longest_exercise_seconds INTEGER
                        CHECK (longest_exercise_seconds IS NULL OR longest_exercise_seconds > 0),
                    notes TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_record_steps (
                    record_id INTEGER NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    step_id TEXT NOT NULL,
                    kind TEXT NOT NULL CHECK (kind IN ('treadmill', 'exercise')),
                    label TEXT NOT NULL,
                    speed_kmh REAL,
                    duration_seconds INTEGER CHECK (duration_seconds IS NULL OR duration_seconds >= 0),
                    weight_kg REAL,
                    sets INTEGER,
                    repetitions INTEGER,
                    started_at TEXT,
                    completed_at TEXT,
                    PRIMARY KEY (record_id, position),
                    FOREIGN KEY (record_id) REFERENCES session_records(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_records_user_session_completed
                    ON session_records (user_id, session_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_records_user_completed
                    ON session_records (user_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 1).await?;
        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS workout_plans (
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
                    description TEXT,
                    muscle_group TEXT NOT NULL,
                    session_name TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, name)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS workout_plan_exercises (
                    user_id TEXT NOT NULL,
                    plan_name TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    name TEXT NOT NULL,
                    PRIMARY KEY (user_id, plan_name, position),
                    FOREIGN KEY (user_id, plan_name)
                        REFERENCES workout_plans(user_id, name) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 2).await?;
        tx.commit().await?;
        tracing::info!(version = 2, "applied schema migration");
    }

    Ok(())
}

async fn mark_applied(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
