use serde::{Deserialize, Serialize};
use time::Date;

use super::{aggregate::mean, history::ConsumptionHistory, trend::percentage_change};

fn default_comparison_periods() -> usize {
    3
}

/// Thresholds a period's consumption is checked against. Unset thresholds are skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadingValidationRule {
    pub min_consumption: Option<f64>,
    pub max_consumption: Option<f64>,
    pub max_increase_percentage: Option<f64>,
    pub max_decrease_percentage: Option<f64>,
    /// How many preceding periods form the expected value.
    #[serde(default = "default_comparison_periods")]
    pub comparison_periods: usize,
}

impl Default for ReadingValidationRule {
    fn default() -> Self {
        Self {
            min_consumption: None,
            max_consumption: None,
            max_increase_percentage: None,
            max_decrease_percentage: None,
            comparison_periods: default_comparison_periods(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    BelowMinimum,
    AboveMaximum,
    SharpIncrease,
    SharpDecrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    fn from_deviation(deviation_percentage: Option<f64>) -> Self {
        match deviation_percentage.map(f64::abs) {
            Some(d) if d < 50.0 => Self::Low,
            Some(d) if d < 100.0 => Self::Medium,
            Some(_) => Self::High,
            None => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionAnomaly {
    pub date: Date,
    pub consumption: f64,
    pub expected_consumption: Option<f64>,
    pub deviation_percentage: Option<f64>,
    pub reason: AnomalyReason,
    pub severity: Severity,
}

/// Flag periods that break the rule. Each period reports at most one reason,
/// absolute thresholds taking precedence over relative ones.
pub fn detect_anomalies(
    history: &ConsumptionHistory,
    rule: &ReadingValidationRule,
) -> Vec<ConsumptionAnomaly> {
    let values = history.values();
    let mut out = Vec::new();

    for (i, point) in history.data.iter().enumerate() {
        let window = &values[i.saturating_sub(rule.comparison_periods)..i];
        let expected = (!window.is_empty()).then(|| mean(window));
        let deviation = expected.map(|e| percentage_change(point.value, e));

        let reason = if rule.min_consumption.is_some_and(|min| point.value < min) {
            Some(AnomalyReason::BelowMinimum)
        } else if rule.max_consumption.is_some_and(|max| point.value > max) {
            Some(AnomalyReason::AboveMaximum)
        } else if deviation.zip(rule.max_increase_percentage).is_some_and(|(d, limit)| d > limit) {
            Some(AnomalyReason::SharpIncrease)
        } else if deviation.zip(rule.max_decrease_percentage).is_some_and(|(d, limit)| d < -limit) {
            Some(AnomalyReason::SharpDecrease)
        } else {
            None
        };

        if let Some(reason) = reason {
            out.push(ConsumptionAnomaly {
                date: point.date,
                consumption: point.value,
                expected_consumption: expected,
                deviation_percentage: deviation,
                reason,
                severity: Severity::from_deviation(deviation),
            });
        }
    }

    out
}
