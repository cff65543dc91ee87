use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use super::series::ReadingSeries;

/// Consumption over one period, dated by the reading that closed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionDataPoint {
    pub date: Date,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodDeltas {
    /// Non-negative deltas, oldest first.
    pub points: Vec<ConsumptionDataPoint>,
    /// Adjacent pairs whose value decreased (meter reset or replacement).
    pub discontinuities: usize,
}

impl PeriodDeltas {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Per-period consumption between chronologically adjacent readings.
///
/// A decrease is a discontinuity, not consumption: the pair is dropped and
/// counted instead.
pub fn period_deltas(series: &ReadingSeries) -> PeriodDeltas {
    let mut out = PeriodDeltas::default();

    for pair in series.samples().windows(2) {
        let (older, newer) = (pair[0], pair[1]);
        let delta = newer.value - older.value;
        if delta >= 0.0 {
            out.points.push(ConsumptionDataPoint {
                date: newer.date,
                value: delta,
                label: None,
            });
        } else {
            out.discontinuities += 1;
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumptionTotals {
    pub total: f64,
    pub average: f64,
    pub periods: usize,
}

impl ConsumptionTotals {
    /// No period survived filtering, so the average carries no information.
    pub fn is_insufficient(&self) -> bool {
        self.periods == 0
    }
}

pub fn totals(values: &[f64]) -> ConsumptionTotals {
    let total: f64 = values.iter().sum();
    ConsumptionTotals {
        total,
        average: mean(values),
        periods: values.len(),
    }
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyConsumption {
    pub year: i32,
    pub month: u8,
    pub total_consumption: f64,
    pub period_count: usize,
    pub average_consumption: f64,
    pub min_consumption: f64,
    pub max_consumption: f64,
}

/// Calendar-month rollup of period consumption, ascending by month.
pub fn monthly_consumption(points: &[ConsumptionDataPoint]) -> Vec<MonthlyConsumption> {
    let mut months: BTreeMap<(i32, u8), Vec<f64>> = BTreeMap::new();
    for p in points {
        months
            .entry((p.date.year(), p.date.month() as u8))
            .or_default()
            .push(p.value);
    }

    months
        .into_iter()
        .map(|((year, month), values)| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let t = totals(&values);
            MonthlyConsumption {
                year,
                month,
                total_consumption: t.total,
                period_count: t.periods,
                average_consumption: t.average,
                min_consumption: min,
                max_consumption: max,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::series::ReadingSample;
    use time::macros::date;

    fn series(values: &[(Date, f64)]) -> ReadingSeries {
        ReadingSeries::from_samples(
            values
                .iter()
                .map(|&(date, value)| ReadingSample { date, value })
                .collect(),
        )
    }

    #[test]
    fn deltas_between_adjacent_readings() {
        let s = series(&[
            (date!(2024 - 01 - 01), 100.0),
            (date!(2024 - 02 - 01), 120.0),
            (date!(2024 - 03 - 01), 150.0),
            (date!(2024 - 04 - 01), 200.0),
        ]);

        let deltas = period_deltas(&s);
        assert_eq!(deltas.values(), vec![20.0, 30.0, 50.0]);
        assert_eq!(deltas.points[0].date, date!(2024 - 02 - 01));
        assert_eq!(deltas.discontinuities, 0);
    }

    #[test]
    fn meter_reset_is_excluded_and_counted() {
        let s = series(&[
            (date!(2024 - 01 - 01), 900.0),
            (date!(2024 - 02 - 01), 950.0),
            (date!(2024 - 03 - 01), 5.0),
            (date!(2024 - 04 - 01), 25.0),
        ]);

        let deltas = period_deltas(&s);
        assert_eq!(deltas.values(), vec![50.0, 20.0]);
        assert_eq!(deltas.discontinuities, 1);
    }

    #[test]
    fn fewer_than_two_readings_yield_no_periods() {
        assert!(period_deltas(&series(&[])).points.is_empty());
        assert!(period_deltas(&series(&[(date!(2024 - 01 - 01), 10.0)])).points.is_empty());
    }

    #[test]
    fn totals_never_divide_by_zero() {
        let t = totals(&[]);
        assert_eq!(t.total, 0.0);
        assert_eq!(t.average, 0.0);
        assert!(t.is_insufficient());
    }

    #[test]
    fn totals_sum_and_average() {
        let t = totals(&[20.0, 30.0, 50.0]);
        assert_eq!(t.total, 100.0);
        assert!((t.average - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(t.periods, 3);
    }

    #[test]
    fn monthly_rollup_groups_by_calendar_month() {
        let points = vec![
            ConsumptionDataPoint {
                date: date!(2024 - 01 - 10),
                value: 10.0,
                label: None,
            },
            ConsumptionDataPoint {
                date: date!(2024 - 01 - 25),
                value: 30.0,
                label: None,
            },
            ConsumptionDataPoint {
                date: date!(2024 - 02 - 03),
                value: 5.0,
                label: None,
            },
        ];

        let months = monthly_consumption(&points);
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2024, 1));
        assert_eq!(months[0].total_consumption, 40.0);
        assert_eq!(months[0].average_consumption, 20.0);
        assert_eq!(months[0].min_consumption, 10.0);
        assert_eq!(months[0].max_consumption, 30.0);
        assert_eq!(months[1].period_count, 1);
    }
}
