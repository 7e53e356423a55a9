//! In-memory [`RecordStore`] used by the engine and router tests.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;

use super::{LapScope, RaceFilter, RecordStore};
use crate::models::fixtures::{driver, lap, race};
use crate::models::{Driver, Lap, Race, RowCounts, SeasonCounts};

// ---

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub races: Vec<Race>,
    pub drivers: Vec<Driver>,
    pub laps: Vec<Lap>,
}

impl MemoryStore {
    // ---
    fn race_year(&self, race_id: i32) -> Option<i32> {
        self.races
            .iter()
            .find(|r| r.race_id == race_id)
            .map(|r| r.year)
    }

    fn in_scope(&self, l: &Lap, scope: LapScope) -> bool {
        // ---
        match scope {
            LapScope::All => true,
            LapScope::Race(race_id) => l.race_id == race_id,
            LapScope::Season(year) => self.race_year(l.race_id) == Some(year),
        }
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    async fn list_races(&self) -> Result<Vec<Race>, Infallible> {
        // ---
        let mut races = self.races.clone();
        races.sort_by_key(|r| (r.year, r.round));
        Ok(races)
    }

    async fn get_race(&self, race_id: i32) -> Result<Option<Race>, Infallible> {
        Ok(self.races.iter().find(|r| r.race_id == race_id).cloned())
    }

    async fn find_driver(&self, code: &str) -> Result<Option<Driver>, Infallible> {
        Ok(self.drivers.iter().find(|d| d.code == code).cloned())
    }

    async fn list_drivers(&self, scope: LapScope) -> Result<Vec<Driver>, Infallible> {
        // ---
        let with_laps: BTreeSet<i32> = self
            .laps
            .iter()
            .filter(|l| self.in_scope(l, scope))
            .map(|l| l.driver_id)
            .collect();
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .filter(|d| scope == LapScope::All || with_laps.contains(&d.driver_id))
            .cloned()
            .collect();
        drivers.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(drivers)
    }

    async fn drivers_by_ids(&self, driver_ids: &[i32]) -> Result<Vec<Driver>, Infallible> {
        // ---
        Ok(self
            .drivers
            .iter()
            .filter(|d| driver_ids.contains(&d.driver_id))
            .cloned()
            .collect())
    }

    async fn race_laps(&self, race_id: i32) -> Result<Vec<Lap>, Infallible> {
        // ---
        let mut laps: Vec<Lap> = self
            .laps
            .iter()
            .filter(|l| l.race_id == race_id)
            .cloned()
            .collect();
        laps.sort_by_key(|l| (l.driver_id, l.lap_number));
        Ok(laps)
    }

    async fn driver_laps(&self, driver_id: i32, scope: LapScope) -> Result<Vec<Lap>, Infallible> {
        // ---
        let mut laps: Vec<Lap> = self
            .laps
            .iter()
            .filter(|l| l.driver_id == driver_id && self.in_scope(l, scope))
            .cloned()
            .collect();
        laps.sort_by_key(|l| (l.race_id, l.lap_number));
        Ok(laps)
    }

    async fn races_matching(&self, filter: &RaceFilter) -> Result<Vec<Race>, Infallible> {
        // ---
        let mut races: Vec<Race> = self
            .races
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        races.sort_by_key(|r| std::cmp::Reverse((r.year, r.round)));
        Ok(races)
    }

    async fn laps_for_races(&self, race_ids: &[i32]) -> Result<Vec<Lap>, Infallible> {
        // ---
        let mut laps: Vec<Lap> = self
            .laps
            .iter()
            .filter(|l| race_ids.contains(&l.race_id))
            .cloned()
            .collect();
        laps.sort_by_key(|l| (l.race_id, l.driver_id, l.lap_number));
        Ok(laps)
    }

    async fn row_counts(&self) -> Result<RowCounts, Infallible> {
        // ---
        Ok(RowCounts {
            races: self.races.len() as i64,
            drivers: self.drivers.len() as i64,
            laps: self.laps.len() as i64,
        })
    }

    async fn season_breakdown(&self) -> Result<Vec<SeasonCounts>, Infallible> {
        // ---
        let mut seasons: BTreeMap<i32, (BTreeSet<i32>, i64, BTreeSet<i32>)> = BTreeMap::new();
        for r in &self.races {
            seasons.entry(r.year).or_default().0.insert(r.race_id);
        }
        for l in &self.laps {
            if let Some(year) = self.race_year(l.race_id) {
                let entry = seasons.entry(year).or_default();
                entry.1 += 1;
                entry.2.insert(l.driver_id);
            }
        }
        Ok(seasons
            .into_iter()
            .map(|(year, (races, laps, drivers))| SeasonCounts {
                year,
                races: races.len() as i64,
                laps,
                drivers: drivers.len() as i64,
            })
            .collect())
    }
}

/// Two seasons of data:
///
/// - race 1: 2023 Monaco Grand Prix (Monte Carlo). VER and HAM run 3 laps;
///   laps 1-2 are the worked example `90.1/89.5` vs `90.0/89.5`. HAM pits on
///   lap 3. LEC runs 2 laps without a recorded time.
/// - race 2: 2024 Bahrain Grand Prix (Sakhir), VER/HAM, 2 laps each.
/// - race 3: 2024 Monaco Grand Prix (Monte Carlo), no laps stored yet.
/// - driver NOR exists but never drove.
pub fn fixture() -> MemoryStore {
    // ---
    let races = vec![
        race(1, 2023, 6, "Monaco Grand Prix", "Monte Carlo"),
        race(2, 2024, 1, "Bahrain Grand Prix", "Sakhir"),
        race(3, 2024, 8, "Monaco Grand Prix", "Monte Carlo"),
    ];
    let drivers = vec![
        driver(1, "VER"),
        driver(2, "HAM"),
        driver(3, "LEC"),
        driver(4, "NOR"),
    ];

    let mut laps = Vec::new();
    let mut next_id = 0;
    let mut push = |race_id, driver_id, lap_number, time: f64, position| {
        next_id += 1;
        let mut l = lap(next_id, race_id, driver_id, lap_number, time);
        l.position = Some(position);
        laps.push(l);
        laps.len() - 1
    };

    // Monaco 2023
    push(1, 1, 1, 90.1, 2);
    push(1, 1, 2, 89.5, 1);
    push(1, 1, 3, 89.9, 1);
    push(1, 2, 1, 90.0, 1);
    push(1, 2, 2, 89.5, 2);
    let ham_pit = push(1, 2, 3, 112.4, 2);
    let lec_1 = push(1, 3, 1, 0.0, 3);
    let lec_2 = push(1, 3, 2, 0.0, 3);
    // Bahrain 2024
    push(2, 1, 1, 96.2, 1);
    push(2, 1, 2, 95.0, 1);
    push(2, 2, 1, 96.5, 2);
    push(2, 2, 2, 95.4, 2);

    laps[ham_pit].pit_stop = true;
    laps[lec_1].lap_time_secs = None;
    laps[lec_2].lap_time_secs = None;

    MemoryStore {
        races,
        drivers,
        laps,
    }
}
