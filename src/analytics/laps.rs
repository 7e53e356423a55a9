//! Lap metrics engine: fastest lap per driver, race fastest lap, personal
//! bests and stint segmentation for a single race.
//!
//! Input order does not matter; ties are always resolved by lap number, then
//! driver id, so results are deterministic for any row order the store
//! returns. Lap times compare with exact floating equality.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::round_ms;
use super::stats::{mean, valid_times};
use crate::error::{AnalyticsError, Result};
use crate::models::{Driver, Lap, Race};
use crate::store::{LapScope, RecordStore};

// ---

/// A driver's fastest valid lap and where it ranks in the race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLap {
    /// 1 = fastest lap of the race.
    pub rank: u32,
    pub lap: Lap,
}

/// Contiguous laps by one driver on one set of tyres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stint {
    pub driver_id: i32,
    pub stint: Option<i32>,
    pub compound: Option<String>,
    pub first_lap: i32,
    pub last_lap: i32,
    pub lap_count: usize,
    pub tyre_life_start: Option<i32>,
    pub tyre_life_end: Option<i32>,
    pub valid_laps: usize,
    pub avg_lap_time: Option<f64>,
    pub best_lap_time: Option<f64>,
}

/// Order two laps by time, then lap number, then driver id.
///
/// Invalid laps sort after every valid one.
fn by_pace(a: &Lap, b: &Lap) -> Ordering {
    // ---
    let ta = a.valid_time().unwrap_or(f64::INFINITY);
    let tb = b.valid_time().unwrap_or(f64::INFINITY);
    ta.total_cmp(&tb)
        .then(a.lap_number.cmp(&b.lap_number))
        .then(a.driver_id.cmp(&b.driver_id))
}

/// Each driver's fastest valid lap, keyed by driver id.
///
/// Drivers without a valid lap are omitted. Ranks are sequential across the
/// selected laps, ordered by [`by_pace`].
pub fn fastest_per_driver(laps: &[Lap]) -> BTreeMap<i32, RankedLap> {
    // ---
    let mut best: HashMap<i32, &Lap> = HashMap::new();
    for lap in laps.iter().filter(|l| l.is_valid()) {
        best.entry(lap.driver_id)
            .and_modify(|current| {
                if by_pace(lap, *current) == Ordering::Less {
                    *current = lap;
                }
            })
            .or_insert(lap);
    }

    let mut ordered: Vec<&Lap> = best.into_values().collect();
    ordered.sort_by(|a, b| by_pace(a, b));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, lap)| {
            let ranked = RankedLap {
                rank: i as u32 + 1,
                lap: lap.clone(),
            };
            (lap.driver_id, ranked)
        })
        .collect()
}

/// The single fastest valid lap of the race, if any lap is valid.
pub fn race_fastest(laps: &[Lap]) -> Option<&Lap> {
    laps.iter().filter(|l| l.is_valid()).min_by(|a, b| by_pace(a, b))
}

/// Personal-best lap id per driver.
pub fn personal_bests(laps: &[Lap]) -> BTreeMap<i32, i32> {
    // ---
    fastest_per_driver(laps)
        .into_iter()
        .map(|(driver_id, ranked)| (driver_id, ranked.lap.lap_id))
        .collect()
}

/// Recompute `is_fastest` / `is_personal_best` from the lap times.
///
/// Returns fresh copies; the stored flags are never trusted or mutated.
pub fn with_computed_flags(laps: &[Lap]) -> Vec<Lap> {
    // ---
    let fastest_id = race_fastest(laps).map(|l| l.lap_id);
    let bests = personal_bests(laps);

    laps.iter()
        .map(|l| Lap {
            is_fastest: Some(l.lap_id) == fastest_id,
            is_personal_best: bests.get(&l.driver_id) == Some(&l.lap_id),
            ..l.clone()
        })
        .collect()
}

fn same_stint(a: &Lap, b: &Lap) -> bool {
    a.driver_id == b.driver_id && a.stint == b.stint && a.compound == b.compound
}

/// Split laps into stints, ordered by driver then first lap.
///
/// A new stint starts whenever the driver, the stint number, or the compound
/// changes between consecutive laps.
pub fn stints(laps: &[Lap]) -> Vec<Stint> {
    // ---
    let mut sorted: Vec<&Lap> = laps.iter().collect();
    sorted.sort_by_key(|l| (l.driver_id, l.lap_number));

    sorted
        .chunk_by(|a, b| same_stint(a, b))
        .map(|run| {
            let first = run[0];
            let last = run[run.len() - 1];
            let times = valid_times(run.iter().copied());
            Stint {
                driver_id: first.driver_id,
                stint: first.stint,
                compound: first.compound.clone(),
                first_lap: first.lap_number,
                last_lap: last.lap_number,
                lap_count: run.len(),
                tyre_life_start: first.tyre_life,
                tyre_life_end: last.tyre_life,
                valid_laps: times.len(),
                avg_lap_time: mean(&times).map(round_ms),
                best_lap_time: times.iter().copied().min_by(f64::total_cmp),
            }
        })
        .collect()
}

// --- store-backed entry points

/// Fastest lap of one driver, as served by `/laps/race/{id}/fastest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestLapEntry {
    pub rank: u32,
    pub driver: String,
    pub lap_number: i32,
    pub lap_time: f64,
    /// Gap to the race's fastest lap.
    pub gap: f64,
    pub sector1: Option<f64>,
    pub sector2: Option<f64>,
    pub sector3: Option<f64>,
    pub stint: Option<i32>,
    pub compound: Option<String>,
    pub tyre_life: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceFastestLaps {
    pub race_id: i32,
    pub race: String,
    pub year: i32,
    pub fastest_laps: Vec<FastestLapEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStint {
    pub driver: String,
    #[serde(flatten)]
    pub stint: Stint,
}

/// One lap as listed by `/races/{id}/laps`, with flags recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapRow {
    pub driver: String,
    pub lap_number: i32,
    pub lap_time: Option<f64>,
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub s3: Option<f64>,
    pub stint: Option<i32>,
    pub compound: Option<String>,
    pub tyre_life: Option<i32>,
    pub fresh_tire: Option<bool>,
    pub pit_stop: bool,
    pub position: Option<i32>,
    pub is_fastest: bool,
    pub is_personal_best: bool,
}

pub(crate) async fn require_race<S: RecordStore>(store: &S, race_id: i32) -> Result<Race> {
    // ---
    store
        .get_race(race_id)
        .await
        .map_err(AnalyticsError::store)?
        .ok_or_else(|| AnalyticsError::NotFound(format!("race {race_id}")))
}

async fn race_drivers<S: RecordStore>(store: &S, race_id: i32) -> Result<HashMap<i32, Driver>> {
    // ---
    let drivers = store
        .list_drivers(LapScope::Race(race_id))
        .await
        .map_err(AnalyticsError::store)?;
    Ok(drivers.into_iter().map(|d| (d.driver_id, d)).collect())
}

pub(crate) fn code_of(drivers: &HashMap<i32, Driver>, driver_id: i32) -> String {
    // ---
    drivers
        .get(&driver_id)
        .map(|d| d.code.clone())
        .unwrap_or_else(|| format!("#{driver_id}"))
}

/// Per-driver fastest laps of a race, ordered by rank.
pub async fn race_fastest_laps<S: RecordStore>(store: &S, race_id: i32) -> Result<RaceFastestLaps> {
    // ---
    let race = require_race(store, race_id).await?;
    let laps = store.race_laps(race_id).await.map_err(AnalyticsError::store)?;
    let drivers = race_drivers(store, race_id).await?;

    let mut ranked: Vec<RankedLap> = fastest_per_driver(&laps).into_values().collect();
    ranked.sort_by_key(|r| r.rank);
    let leader = ranked.first().and_then(|r| r.lap.valid_time());

    let fastest_laps = ranked
        .into_iter()
        .filter_map(|RankedLap { rank, lap }| {
            let lap_time = lap.valid_time()?;
            Some(FastestLapEntry {
                rank,
                driver: code_of(&drivers, lap.driver_id),
                lap_number: lap.lap_number,
                lap_time,
                gap: round_ms(lap_time - leader.unwrap_or(lap_time)),
                sector1: lap.sector1_time_secs,
                sector2: lap.sector2_time_secs,
                sector3: lap.sector3_time_secs,
                stint: lap.stint,
                compound: lap.compound,
                tyre_life: lap.tyre_life,
            })
        })
        .collect();

    Ok(RaceFastestLaps {
        race_id: race.race_id,
        race: race.name,
        year: race.year,
        fastest_laps,
    })
}

/// Stint breakdown of a race.
pub async fn race_stints<S: RecordStore>(store: &S, race_id: i32) -> Result<Vec<DriverStint>> {
    // ---
    require_race(store, race_id).await?;
    let laps = store.race_laps(race_id).await.map_err(AnalyticsError::store)?;
    let drivers = race_drivers(store, race_id).await?;

    Ok(stints(&laps)
        .into_iter()
        .map(|stint| DriverStint {
            driver: code_of(&drivers, stint.driver_id),
            stint,
        })
        .collect())
}

/// Laps of a race, optionally for one driver, ordered by driver code then
/// lap number. An unknown driver code yields an empty list.
pub async fn race_laps<S: RecordStore>(
    store: &S,
    race_id: i32,
    driver_code: Option<&str>,
) -> Result<Vec<LapRow>> {
    // ---
    require_race(store, race_id).await?;

    let only = match driver_code {
        Some(code) => {
            let code = super::normalize_code(code)?;
            match store.find_driver(&code).await.map_err(AnalyticsError::store)? {
                Some(d) => Some(d.driver_id),
                None => return Ok(Vec::new()),
            }
        }
        None => None,
    };

    let laps = store.race_laps(race_id).await.map_err(AnalyticsError::store)?;
    let drivers = race_drivers(store, race_id).await?;

    let mut rows: Vec<LapRow> = with_computed_flags(&laps)
        .into_iter()
        .filter(|l| only.map_or(true, |id| l.driver_id == id))
        .map(|l| LapRow {
            driver: code_of(&drivers, l.driver_id),
            lap_number: l.lap_number,
            lap_time: l.lap_time_secs,
            s1: l.sector1_time_secs,
            s2: l.sector2_time_secs,
            s3: l.sector3_time_secs,
            stint: l.stint,
            compound: l.compound,
            tyre_life: l.tyre_life,
            fresh_tire: l.fresh_tire,
            pit_stop: l.pit_stop,
            position: l.position,
            is_fastest: l.is_fastest,
            is_personal_best: l.is_personal_best,
        })
        .collect();
    rows.sort_by(|a, b| a.driver.cmp(&b.driver).then(a.lap_number.cmp(&b.lap_number)));
    Ok(rows)
}
