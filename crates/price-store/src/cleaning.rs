use crate::error::StoreError;
use analytics::stats;
use chrono::NaiveDate;
use configuration::CleaningPolicy;
use core_types::{Observation, PriceSeries, RawObservation};
use serde::Serialize;

/// What cleaning did to one symbol's raw observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub raw: usize,
    /// Observations discarded because a later one carried the same date.
    pub duplicates: usize,
    /// Closes that were present but not positive and finite.
    pub invalid: usize,
    /// Missing or excluded closes replaced by the previous valid close.
    pub filled: usize,
    /// Missing or excluded closes removed, either leading or because filling
    /// is disabled.
    pub dropped: usize,
    /// Prices excluded by the IQR return filter.
    pub outliers: usize,
    pub retained: usize,
}

/// A date in the cleaned index with its close, if one is known.
type Slot = (NaiveDate, Option<f64>);

/// Cleans `raw` into a `PriceSeries` according to `policy`.
pub fn clean(
    symbol: &str,
    raw: &[RawObservation],
    policy: &CleaningPolicy,
) -> Result<(PriceSeries, CleaningSummary), StoreError> {
    let mut summary = CleaningSummary {
        raw: raw.len(),
        ..CleaningSummary::default()
    };

    let mut slots = normalize(raw, &mut summary);

    // Outliers are judged on observed closes only; filled days would add zero returns.
    if policy.remove_outliers {
        let flagged = flag_return_outliers(&slots, policy.iqr_multiplier);
        if !flagged.is_empty() {
            summary.outliers = flagged.len();
            for &idx in &flagged {
                slots[idx].1 = None;
            }
            tracing::warn!(
                symbol,
                outliers = summary.outliers,
                "Excluded prices with outlying one-day returns"
            );
        }
    }

    let (observations, gaps) = fill(&slots, policy.forward_fill);
    summary.filled = gaps.filled;
    summary.dropped = gaps.dropped;

    summary.retained = observations.len();
    if observations.len() < 2 {
        return Err(StoreError::InsufficientData {
            symbol: symbol.to_string(),
            valid: observations.len(),
        });
    }

    if summary.duplicates > 0 {
        tracing::warn!(symbol, duplicates = summary.duplicates, "Duplicate dates collapsed");
    }
    if summary.dropped > 0 {
        tracing::warn!(symbol, dropped = summary.dropped, "Missing closes dropped");
    }
    tracing::debug!(symbol, ?summary, "Cleaned price series");

    Ok((PriceSeries::new(symbol, observations)?, summary))
}

/// Sorts by date, keeps the last observation per date and blanks invalid closes.
fn normalize(raw: &[RawObservation], summary: &mut CleaningSummary) -> Vec<Slot> {
    let mut sorted = raw.to_vec();
    // stable, so the later of two same-date observations stays later
    sorted.sort_by_key(|o| o.date);

    let mut slots: Vec<Slot> = Vec::with_capacity(sorted.len());
    for obs in sorted {
        let close = match obs.close {
            Some(price) if price.is_finite() && price > 0.0 => Some(price),
            Some(_) => {
                summary.invalid += 1;
                None
            }
            None => None,
        };
        match slots.last_mut() {
            Some(last) if last.0 == obs.date => {
                summary.duplicates += 1;
                last.1 = close;
            }
            _ => slots.push((obs.date, close)),
        }
    }
    slots
}

#[derive(Debug, Default)]
struct GapCounts {
    filled: usize,
    dropped: usize,
}

fn fill(slots: &[Slot], forward_fill: bool) -> (Vec<Observation>, GapCounts) {
    let mut counts = GapCounts::default();
    let mut observations = Vec::with_capacity(slots.len());
    let mut last_valid: Option<f64> = None;

    for &(date, close) in slots {
        match (close, last_valid) {
            (Some(price), _) => {
                last_valid = Some(price);
                observations.push(Observation::new(date, price));
            }
            (None, Some(previous)) if forward_fill => {
                counts.filled += 1;
                observations.push(Observation::new(date, previous));
            }
            (None, _) => counts.dropped += 1,
        }
    }
    (observations, counts)
}

/// Slot indices of closes whose return from the previous observed close lies
/// outside `[Q1 - k * IQR, Q3 + k * IQR]` of the observed return distribution.
///
/// A return measured from a close that was itself flagged is not judged, so the
/// day after a one-day spike keeps its price.
fn flag_return_outliers(slots: &[Slot], multiplier: f64) -> Vec<usize> {
    let observed: Vec<(usize, f64)> = slots
        .iter()
        .enumerate()
        .filter_map(|(idx, &(_, close))| close.map(|price| (idx, price)))
        .collect();
    let returns: Vec<f64> = observed
        .windows(2)
        .map(|w| (w[1].1 - w[0].1) / w[0].1)
        .collect();
    if returns.len() < 2 {
        return Vec::new();
    }

    let sorted = stats::sorted(&returns);
    let (Some(q1), Some(q3)) = (stats::quantile(&sorted, 0.25), stats::quantile(&sorted, 0.75))
    else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - multiplier * iqr, q3 + multiplier * iqr);

    let mut flagged: Vec<usize> = Vec::new();
    for (t, r) in returns.iter().enumerate() {
        if flagged.last() == Some(&observed[t].0) {
            continue;
        }
        if *r < lower || *r > upper {
            flagged.push(observed[t + 1].0);
        }
    }
    flagged
}
