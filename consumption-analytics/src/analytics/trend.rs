//! Directional trend of a consumption sequence.
//!
//! The sequence is split into a recent half and an older half; the trend is
//! the percentage change of the recent mean over the older mean, classified
//! against a fixed deadband so that noise reads as `Stable`.

use serde::Serialize;

use super::aggregate::mean;

/// Changes within ±5% are reported as stable.
pub const TREND_DEADBAND_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub change_percentage: f64,
}

impl TrendSummary {
    pub const STABLE: Self = Self {
        direction: TrendDirection::Stable,
        change_percentage: 0.0,
    };
}

/// Relative change of `current` over `baseline` in percent.
///
/// A zero baseline yields `0.0` rather than an infinite or NaN change.
pub fn percentage_change(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (current - baseline) / baseline * 100.0
    }
}

pub fn classify_change(change_percentage: f64) -> TrendDirection {
    if change_percentage > TREND_DEADBAND_PERCENT {
        TrendDirection::Up
    } else if change_percentage < -TREND_DEADBAND_PERCENT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Classify the trend of per-period consumption given oldest first.
///
/// The recent half is the last `n / 2` values; the older half is everything
/// before it, so for odd lengths the extra value falls in the older half.
/// With fewer than two values one half is empty and the result is
/// [`TrendSummary::STABLE`].
pub fn classify_trend(values: &[f64]) -> TrendSummary {
    let recent_len = values.len() / 2;
    if recent_len == 0 {
        return TrendSummary::STABLE;
    }

    let (older, recent) = values.split_at(values.len() - recent_len);
    let change_percentage = percentage_change(mean(recent), mean(older));

    TrendSummary {
        direction: classify_change(change_percentage),
        change_percentage,
    }
}
