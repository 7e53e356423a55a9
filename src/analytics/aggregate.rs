//! Circuit and season aggregation.
//!
//! Races are selected with a [`RaceFilter`], grouped (per circuit, or the
//! whole season), and summarised. A filter that matches nothing produces a
//! summary with `empty: true` and `race_count: 0`, never an error.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::laps::{code_of, race_fastest};
use super::stats::{mean, valid_times};
use super::{check_year, round_ms};
use crate::error::{AnalyticsError, Result};
use crate::models::{Driver, Lap, Race};
use crate::store::{RaceFilter, RecordStore};

// ---

/// Number of drivers listed in a season's fastest-lap table.
pub const TOP_DRIVERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestLapHolder {
    pub driver: String,
    pub lap_time: f64,
    pub race_id: i32,
    pub race: String,
    pub circuit: Option<String>,
    pub year: i32,
    pub compound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub empty: bool,
    pub race_count: usize,
    pub total_laps: usize,
    pub unique_drivers: usize,
    pub avg_lap_time: Option<f64>,
    pub avg_winning_margin: Option<f64>,
    pub fastest_lap: Option<FastestLapHolder>,
}

impl GroupSummary {
    pub fn empty() -> Self {
        // ---
        Self {
            empty: true,
            race_count: 0,
            total_laps: 0,
            unique_drivers: 0,
            avg_lap_time: None,
            avg_winning_margin: None,
            fastest_lap: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverTally {
    pub driver: String,
    pub fastest_lap_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceLapCount {
    pub race_id: i32,
    pub year: i32,
    pub round: i32,
    pub race_name: String,
    pub total_laps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceFastestLap {
    pub race_id: i32,
    pub year: i32,
    pub driver: String,
    pub lap_time: f64,
    pub compound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitGroup {
    pub circuit: String,
    #[serde(flatten)]
    pub summary: GroupSummary,
    /// Newest first, capped by the request limit.
    pub races: Vec<RaceLapCount>,
    pub fastest_laps: Vec<RaceFastestLap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitPerformance {
    pub circuit: String,
    pub empty: bool,
    pub race_count: usize,
    pub groups: Vec<CircuitGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub year: i32,
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub top_drivers: Vec<DriverTally>,
}

fn laps_by_race(laps: &[Lap]) -> BTreeMap<i32, Vec<Lap>> {
    // ---
    let mut grouped: BTreeMap<i32, Vec<Lap>> = BTreeMap::new();
    for l in laps {
        grouped.entry(l.race_id).or_default().push(l.clone());
    }
    grouped
}

/// Gap between the winner and the runner-up, in seconds.
///
/// Both are read from the running positions on the race's final lap. The
/// margin is only computable when both drivers have a recorded time on every
/// lap, pit laps included, since it compares total race time.
pub fn winning_margin(laps: &[Lap]) -> Option<f64> {
    // ---
    let final_lap = laps.iter().map(|l| l.lap_number).max()?;
    let classified = |position: i32| {
        laps.iter()
            .find(|l| l.lap_number == final_lap && l.position == Some(position))
    };
    let winner = classified(1)?;
    let runner_up = classified(2)?;

    let race_time = |driver_id: i32| -> Option<f64> {
        let own: Vec<&Lap> = laps.iter().filter(|l| l.driver_id == driver_id).collect();
        if own.len() != final_lap as usize {
            return None;
        }
        own.iter()
            .map(|l| l.lap_time_secs.filter(|t| *t > 0.0))
            .sum::<Option<f64>>()
    };

    let margin = race_time(runner_up.driver_id)? - race_time(winner.driver_id)?;
    (margin >= 0.0).then(|| round_ms(margin))
}

/// Summarise the laps of `races`. Laps of other races are ignored.
pub fn summarize(races: &[Race], laps: &[Lap], drivers: &HashMap<i32, Driver>) -> GroupSummary {
    // ---
    if races.is_empty() {
        return GroupSummary::empty();
    }

    let ids: BTreeSet<i32> = races.iter().map(|r| r.race_id).collect();
    let in_group: Vec<Lap> = laps
        .iter()
        .filter(|l| ids.contains(&l.race_id))
        .cloned()
        .collect();

    let unique_drivers = in_group
        .iter()
        .map(|l| l.driver_id)
        .collect::<BTreeSet<_>>()
        .len();

    let margins: Vec<f64> = laps_by_race(&in_group)
        .values()
        .filter_map(|race_laps| winning_margin(race_laps))
        .collect();

    let fastest_lap = race_fastest(&in_group).and_then(|lap| {
        let race = races.iter().find(|r| r.race_id == lap.race_id)?;
        Some(FastestLapHolder {
            driver: code_of(drivers, lap.driver_id),
            lap_time: lap.valid_time()?,
            race_id: race.race_id,
            race: race.name.clone(),
            circuit: race.circuit.clone(),
            year: race.year,
            compound: lap.compound.clone(),
        })
    });

    GroupSummary {
        empty: false,
        race_count: races.len(),
        total_laps: in_group.len(),
        unique_drivers,
        avg_lap_time: mean(&valid_times(&in_group)).map(round_ms),
        avg_winning_margin: mean(&margins).map(round_ms),
        fastest_lap,
    }
}

/// How often each driver set a race's fastest lap, most first.
pub fn fastest_lap_tally(laps: &[Lap], drivers: &HashMap<i32, Driver>) -> Vec<DriverTally> {
    // ---
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for race_laps in laps_by_race(laps).values() {
        if let Some(lap) = race_fastest(race_laps) {
            *counts.entry(lap.driver_id).or_default() += 1;
        }
    }

    let mut tally: Vec<DriverTally> = counts
        .into_iter()
        .map(|(driver_id, fastest_lap_count)| DriverTally {
            driver: code_of(drivers, driver_id),
            fastest_lap_count,
        })
        .collect();
    tally.sort_by(|a, b| {
        b.fastest_lap_count
            .cmp(&a.fastest_lap_count)
            .then_with(|| a.driver.cmp(&b.driver))
    });
    tally
}

fn circuit_key(race: &Race) -> String {
    race.circuit.clone().unwrap_or_else(|| race.name.clone())
}

/// Group matched races per circuit and summarise each group.
///
/// `races` is expected newest first; each group lists at most `limit` races.
pub fn circuit_performance_from(
    circuit: &str,
    races: &[Race],
    laps: &[Lap],
    drivers: &HashMap<i32, Driver>,
    limit: usize,
) -> CircuitPerformance {
    // ---
    let mut grouped: BTreeMap<String, Vec<Race>> = BTreeMap::new();
    for race in races {
        grouped.entry(circuit_key(race)).or_default().push(race.clone());
    }
    let per_race = laps_by_race(laps);
    let no_laps: Vec<Lap> = Vec::new();

    let groups = grouped
        .into_iter()
        .map(|(name, group_races)| {
            let listed: Vec<&Race> = group_races.iter().take(limit).collect();

            let race_rows = listed
                .iter()
                .map(|r| RaceLapCount {
                    race_id: r.race_id,
                    year: r.year,
                    round: r.round,
                    race_name: r.name.clone(),
                    total_laps: per_race.get(&r.race_id).map_or(0, Vec::len),
                })
                .collect();

            let fastest_laps = listed
                .iter()
                .filter_map(|r| {
                    let race_laps = per_race.get(&r.race_id).unwrap_or(&no_laps);
                    let lap = race_fastest(race_laps)?;
                    Some(RaceFastestLap {
                        race_id: r.race_id,
                        year: r.year,
                        driver: code_of(drivers, lap.driver_id),
                        lap_time: lap.valid_time()?,
                        compound: lap.compound.clone(),
                    })
                })
                .collect();

            CircuitGroup {
                circuit: name,
                summary: summarize(&group_races, laps, drivers),
                races: race_rows,
                fastest_laps,
            }
        })
        .collect();

    CircuitPerformance {
        circuit: circuit.to_string(),
        empty: races.is_empty(),
        race_count: races.len(),
        groups,
    }
}

pub fn season_summary_from(
    year: i32,
    races: &[Race],
    laps: &[Lap],
    drivers: &HashMap<i32, Driver>,
) -> SeasonSummary {
    // ---
    let mut top_drivers = fastest_lap_tally(laps, drivers);
    top_drivers.truncate(TOP_DRIVERS);

    SeasonSummary {
        year,
        summary: summarize(races, laps, drivers),
        top_drivers,
    }
}

// --- store-backed entry points

/// Fetch the races selected by `filter` (re-checked with
/// [`RaceFilter::matches`]), their laps, and the drivers who set them.
async fn snapshot<S: RecordStore>(
    store: &S,
    filter: &RaceFilter,
) -> Result<(Vec<Race>, Vec<Lap>, HashMap<i32, Driver>)> {
    // ---
    let races: Vec<Race> = store
        .races_matching(filter)
        .await
        .map_err(AnalyticsError::store)?
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();
    if races.is_empty() {
        return Ok((races, Vec::new(), HashMap::new()));
    }

    let race_ids: Vec<i32> = races.iter().map(|r| r.race_id).collect();
    let laps = store
        .laps_for_races(&race_ids)
        .await
        .map_err(AnalyticsError::store)?;

    let driver_ids: Vec<i32> = laps
        .iter()
        .map(|l| l.driver_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let drivers = store
        .drivers_by_ids(&driver_ids)
        .await
        .map_err(AnalyticsError::store)?
        .into_iter()
        .map(|d| (d.driver_id, d))
        .collect();

    Ok((races, laps, drivers))
}

pub async fn circuit_performance<S: RecordStore>(
    store: &S,
    circuit: &str,
    limit: usize,
) -> Result<CircuitPerformance> {
    // ---
    let circuit = circuit.trim();
    if circuit.is_empty() {
        return Err(AnalyticsError::InvalidFilter(
            "circuit must not be empty".to_string(),
        ));
    }
    let filter = RaceFilter::Circuit(circuit.to_string());
    let (races, laps, drivers) = snapshot(store, &filter).await?;
    Ok(circuit_performance_from(circuit, &races, &laps, &drivers, limit))
}

pub async fn season_summary<S: RecordStore>(store: &S, year: i32) -> Result<SeasonSummary> {
    // ---
    let year = check_year(year)?;
    let (races, laps, drivers) = snapshot(store, &RaceFilter::Season(year)).await?;
    Ok(season_summary_from(year, &races, &laps, &drivers))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::fixtures::lap;
    use crate::store::memory::fixture;

    fn positioned(lap_id: i32, driver_id: i32, lap_number: i32, time: f64, pos: i32) -> Lap {
        // ---
        let mut l = lap(lap_id, 1, driver_id, lap_number, time);
        l.position = Some(pos);
        l
    }

    #[test]
    fn test_winning_margin_from_final_lap_positions() {
        // ---
        let laps = vec![
            positioned(1, 1, 1, 90.0, 1),
            positioned(2, 1, 2, 91.0, 1),
            positioned(3, 2, 1, 90.5, 2),
            positioned(4, 2, 2, 91.2, 2),
        ];
        assert_eq!(winning_margin(&laps), Some(0.7));
    }

    #[test]
    fn test_winning_margin_needs_complete_times() {
        // ---
        let mut laps = vec![
            positioned(1, 1, 1, 90.0, 1),
            positioned(2, 1, 2, 91.0, 1),
            positioned(3, 2, 1, 90.5, 2),
            positioned(4, 2, 2, 91.2, 2),
        ];
        laps[2].lap_time_secs = None;
        assert_eq!(winning_margin(&laps), None);

        // No runner-up on the final lap.
        let solo = vec![positioned(1, 1, 1, 90.0, 1)];
        assert_eq!(winning_margin(&solo), None);
        assert_eq!(winning_margin(&[]), None);
    }

    #[test]
    fn test_summarize_empty_group() {
        // ---
        let summary = summarize(&[], &[], &HashMap::new());
        assert!(summary.empty);
        assert_eq!(summary.race_count, 0);
        assert_eq!(summary.fastest_lap, None);
    }

    #[tokio::test]
    async fn test_circuit_filter_matches_race_name() {
        // ---
        let store = fixture();
        let perf = circuit_performance(&store, "monaco", 10).await.unwrap();

        assert!(!perf.empty);
        assert_eq!(perf.race_count, 2);
        assert_eq!(perf.groups.len(), 1);

        let group = &perf.groups[0];
        assert_eq!(group.circuit, "Monte Carlo");
        assert_eq!(group.summary.race_count, 2);
        // Newest first; the 2024 race has no laps yet.
        assert_eq!(group.races[0].year, 2024);
        assert_eq!(group.races[0].total_laps, 0);
        assert_eq!(group.races[1].total_laps, 8);
        assert_eq!(group.fastest_laps.len(), 1);
        assert_eq!(group.fastest_laps[0].driver, "VER");
        assert_eq!(group.fastest_laps[0].lap_time, 89.5);
        // VER 269.5s vs HAM 291.9s over three laps.
        assert_eq!(group.summary.avg_winning_margin, Some(22.4));
    }

    #[tokio::test]
    async fn test_circuit_limit_caps_listed_races() {
        // ---
        let store = fixture();
        let perf = circuit_performance(&store, "Monaco", 1).await.unwrap();
        assert_eq!(perf.groups[0].races.len(), 1);
        assert_eq!(perf.groups[0].summary.race_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_circuit_is_empty_not_error() {
        // ---
        let store = fixture();
        let perf = circuit_performance(&store, "Nonexistent", 10).await.unwrap();
        assert!(perf.empty);
        assert_eq!(perf.race_count, 0);
        assert!(perf.groups.is_empty());
    }

    #[tokio::test]
    async fn test_blank_circuit_is_invalid() {
        // ---
        let store = fixture();
        let err = circuit_performance(&store, "  ", 10).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn test_season_summary() {
        // ---
        let store = fixture();
        let season = season_summary(&store, 2024).await.unwrap();

        assert_eq!(season.summary.race_count, 2);
        assert_eq!(season.summary.total_laps, 4);
        assert_eq!(season.summary.unique_drivers, 2);
        assert_eq!(season.summary.avg_winning_margin, Some(0.7));

        let fastest = season.summary.fastest_lap.unwrap();
        assert_eq!(fastest.driver, "VER");
        assert_eq!(fastest.lap_time, 95.0);
        assert_eq!(fastest.race, "Bahrain Grand Prix");

        assert_eq!(
            season.top_drivers,
            vec![DriverTally {
                driver: "VER".into(),
                fastest_lap_count: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_season() {
        // ---
        let store = fixture();
        let season = season_summary(&store, 1999).await.unwrap();
        assert!(season.summary.empty);
        assert_eq!(season.summary.race_count, 0);
        assert!(season.top_drivers.is_empty());
    }

    #[tokio::test]
    async fn test_season_out_of_range() {
        // ---
        let store = fixture();
        let err = season_summary(&store, 1800).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidFilter(_)));
    }
}
