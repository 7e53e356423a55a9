//! PostgreSQL implementation of [`RecordStore`].

use sqlx::PgPool;
use thiserror::Error;

use super::{LapScope, RaceFilter, RecordStore};
use crate::models::{Driver, Lap, Race, RowCounts, SeasonCounts};

// ---

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Read-only accessor backed by a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
fn like_pattern(needle: &str) -> String {
    // ---
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

impl RecordStore for PgStore {
    type Error = StoreError;

    async fn list_races(&self) -> Result<Vec<Race>> {
        // ---
        let races = sqlx::query_as::<_, Race>(
            "SELECT race_id, year, round, name, circuit, date FROM race ORDER BY year, round",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(races)
    }

    async fn get_race(&self, race_id: i32) -> Result<Option<Race>> {
        // ---
        let race = sqlx::query_as::<_, Race>(
            "SELECT race_id, year, round, name, circuit, date FROM race WHERE race_id = $1",
        )
        .bind(race_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(race)
    }

    async fn find_driver(&self, code: &str) -> Result<Option<Driver>> {
        // ---
        let driver = sqlx::query_as::<_, Driver>(
            "SELECT driver_id, code, full_name, number, team FROM driver WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(driver)
    }

    async fn list_drivers(&self, scope: LapScope) -> Result<Vec<Driver>> {
        // ---
        let query = match scope {
            LapScope::All => sqlx::query_as::<_, Driver>(
                "SELECT driver_id, code, full_name, number, team FROM driver ORDER BY code",
            ),
            LapScope::Race(race_id) => sqlx::query_as::<_, Driver>(
                r#"
                SELECT DISTINCT d.driver_id, d.code, d.full_name, d.number, d.team
                FROM driver d
                JOIN lap l ON l.driver_id = d.driver_id
                WHERE l.race_id = $1
                ORDER BY d.code
                "#,
            )
            .bind(race_id),
            LapScope::Season(year) => sqlx::query_as::<_, Driver>(
                r#"
                SELECT DISTINCT d.driver_id, d.code, d.full_name, d.number, d.team
                FROM driver d
                JOIN lap l  ON l.driver_id = d.driver_id
                JOIN race r ON r.race_id = l.race_id
                WHERE r.year = $1
                ORDER BY d.code
                "#,
            )
            .bind(year),
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn drivers_by_ids(&self, driver_ids: &[i32]) -> Result<Vec<Driver>> {
        // ---
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT driver_id, code, full_name, number, team
            FROM driver
            WHERE driver_id = ANY($1)
            ORDER BY code
            "#,
        )
        .bind(driver_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    async fn race_laps(&self, race_id: i32) -> Result<Vec<Lap>> {
        // ---
        let laps = sqlx::query_as::<_, Lap>(
            "SELECT * FROM lap WHERE race_id = $1 ORDER BY driver_id, lap_number",
        )
        .bind(race_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(laps)
    }

    async fn driver_laps(&self, driver_id: i32, scope: LapScope) -> Result<Vec<Lap>> {
        // ---
        let query = match scope {
            LapScope::All => sqlx::query_as::<_, Lap>(
                "SELECT * FROM lap WHERE driver_id = $1 ORDER BY race_id, lap_number",
            )
            .bind(driver_id),
            LapScope::Race(race_id) => sqlx::query_as::<_, Lap>(
                "SELECT * FROM lap WHERE driver_id = $1 AND race_id = $2 ORDER BY lap_number",
            )
            .bind(driver_id)
            .bind(race_id),
            LapScope::Season(year) => sqlx::query_as::<_, Lap>(
                r#"
                SELECT l.*
                FROM lap l
                JOIN race r ON r.race_id = l.race_id
                WHERE l.driver_id = $1 AND r.year = $2
                ORDER BY l.race_id, l.lap_number
                "#,
            )
            .bind(driver_id)
            .bind(year),
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn races_matching(&self, filter: &RaceFilter) -> Result<Vec<Race>> {
        // ---
        let query = match filter {
            RaceFilter::Circuit(needle) => sqlx::query_as::<_, Race>(
                r#"
                SELECT race_id, year, round, name, circuit, date
                FROM race
                WHERE circuit ILIKE $1 OR name ILIKE $1
                ORDER BY year DESC, round DESC
                "#,
            )
            .bind(like_pattern(needle)),
            RaceFilter::Season(year) => sqlx::query_as::<_, Race>(
                r#"
                SELECT race_id, year, round, name, circuit, date
                FROM race
                WHERE year = $1
                ORDER BY round DESC
                "#,
            )
            .bind(*year),
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn laps_for_races(&self, race_ids: &[i32]) -> Result<Vec<Lap>> {
        // ---
        let laps = sqlx::query_as::<_, Lap>(
            "SELECT * FROM lap WHERE race_id = ANY($1) ORDER BY race_id, driver_id, lap_number",
        )
        .bind(race_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(laps)
    }

    async fn row_counts(&self) -> Result<RowCounts> {
        // ---
        let (races, drivers, laps): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM race),
                (SELECT COUNT(*) FROM driver),
                (SELECT COUNT(*) FROM lap)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(RowCounts {
            races,
            drivers,
            laps,
        })
    }

    async fn season_breakdown(&self) -> Result<Vec<SeasonCounts>> {
        // ---
        let rows = sqlx::query_as::<_, SeasonCounts>(
            r#"
            SELECT
                r.year,
                COUNT(DISTINCT r.race_id)   AS races,
                COUNT(l.lap_id)             AS laps,
                COUNT(DISTINCT l.driver_id) AS drivers
            FROM race r
            LEFT JOIN lap l ON l.race_id = r.race_id
            GROUP BY r.year
            ORDER BY r.year
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
