//! Database schema management for `raceintel`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).
//! Rows are written by the ingestion pipeline; this service only reads them.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `race`, `driver` and `lap` tables. Laps cascade-delete with
/// their race and their driver. Safe to call on every startup; no-op if
/// objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS race (
            race_id  SERIAL PRIMARY KEY,
            year     INTEGER      NOT NULL,
            round    INTEGER      NOT NULL,
            name     VARCHAR(100) NOT NULL,
            circuit  VARCHAR(100),
            date     DATE,
            UNIQUE (year, round)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS driver (
            driver_id  SERIAL PRIMARY KEY,
            code       VARCHAR(3)   NOT NULL UNIQUE,
            full_name  VARCHAR(100) NOT NULL,
            number     INTEGER,
            team       VARCHAR(50)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One row per (race, driver, lap number)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lap (
            lap_id             SERIAL PRIMARY KEY,
            race_id            INTEGER NOT NULL REFERENCES race (race_id) ON DELETE CASCADE,
            driver_id          INTEGER NOT NULL REFERENCES driver (driver_id) ON DELETE CASCADE,
            lap_number         INTEGER NOT NULL,
            lap_time_secs      DOUBLE PRECISION,
            sector1_time_secs  DOUBLE PRECISION,
            sector2_time_secs  DOUBLE PRECISION,
            sector3_time_secs  DOUBLE PRECISION,
            stint              INTEGER,
            compound           VARCHAR(15),
            tyre_life          INTEGER,
            fresh_tire         BOOLEAN,
            pit_in_time_secs   DOUBLE PRECISION,
            pit_out_time_secs  DOUBLE PRECISION,
            pit_stop           BOOLEAN NOT NULL DEFAULT FALSE,
            position           INTEGER,
            is_fastest         BOOLEAN NOT NULL DEFAULT FALSE,
            is_personal_best   BOOLEAN NOT NULL DEFAULT FALSE,
            UNIQUE (race_id, driver_id, lap_number)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Indexes for the common filters (season, race, driver)
    for ddl in [
        "CREATE INDEX IF NOT EXISTS idx_race_year ON race (year);",
        "CREATE INDEX IF NOT EXISTS idx_lap_race_id ON lap (race_id);",
        "CREATE INDEX IF NOT EXISTS idx_lap_driver_id ON lap (driver_id);",
    ] {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}
