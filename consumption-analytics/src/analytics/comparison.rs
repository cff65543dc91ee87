use serde::Serialize;

use super::{aggregate::mean, history::ConsumptionHistory, trend::percentage_change};

/// Latest period against the one before it and against a peer average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumptionComparison {
    pub current_consumption: f64,
    pub previous_consumption: f64,
    pub change_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_reference_percentage: Option<f64>,
}

/// Pooled mean of every period across the given histories.
pub fn reference_average<'a, I>(histories: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a ConsumptionHistory>,
{
    let pooled: Vec<f64> = histories
        .into_iter()
        .flat_map(|h| h.data.iter().map(|p| p.value))
        .collect();
    if pooled.is_empty() {
        None
    } else {
        Some(mean(&pooled))
    }
}

/// `None` when the history has no periods to compare.
pub fn compare(
    history: &ConsumptionHistory,
    reference: Option<f64>,
) -> Option<ConsumptionComparison> {
    let mut recent = history.data.iter().rev();
    let current = recent.next()?.value;
    let previous = recent.next().map(|p| p.value).unwrap_or(0.0);

    Some(ConsumptionComparison {
        current_consumption: current,
        previous_consumption: previous,
        change_percentage: percentage_change(current, previous),
        reference_average: reference,
        vs_reference_percentage: reference.map(|r| percentage_change(current, r)),
    })
}
