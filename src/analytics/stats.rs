//! Summary statistics over lap times.

use serde::Serialize;

use super::round_ms;
use crate::models::Lap;

// ---

/// Pace and consistency figures for a set of valid laps.
///
/// All times are seconds rounded to the millisecond. `std_dev` is the
/// population standard deviation, so a single lap has a spread of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LapStats {
    pub lap_count: usize,
    pub avg_lap_time: f64,
    pub median_lap_time: f64,
    pub fastest_lap: f64,
    pub std_dev: f64,
}

/// Times of the valid laps, in input order.
pub fn valid_times<'a>(laps: impl IntoIterator<Item = &'a Lap>) -> Vec<f64> {
    laps.into_iter().filter_map(Lap::valid_time).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    // ---
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `None` when there are no times to summarise.
pub fn lap_stats(times: &[f64]) -> Option<LapStats> {
    // ---
    let avg = mean(times)?;

    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let variance = times.iter().map(|t| (t - avg).powi(2)).sum::<f64>() / times.len() as f64;

    Some(LapStats {
        lap_count: times.len(),
        avg_lap_time: round_ms(avg),
        median_lap_time: round_ms(median),
        fastest_lap: sorted[0],
        std_dev: round_ms(variance.sqrt()),
    })
}
