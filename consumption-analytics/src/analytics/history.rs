use serde::Serialize;

use super::{
    aggregate::{period_deltas, totals, ConsumptionDataPoint},
    chart::DataPoint,
    format::format_long,
    series::ReadingSeries,
    trend::{classify_trend, TrendDirection},
};

/// Consumption summary for one meter, derived from its readings on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionHistory {
    pub meter_id: String,
    pub unit: String,
    /// Per-period consumption, oldest first.
    pub data: Vec<ConsumptionDataPoint>,
    pub total_consumption: f64,
    pub average_consumption: f64,
    pub trend: TrendDirection,
    pub change_percentage: f64,
    pub discontinuities: usize,
    pub insufficient_data: bool,
}

impl ConsumptionHistory {
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().map(|p| p.value).collect()
    }

    pub fn chart_points(&self) -> Vec<DataPoint> {
        self.data
            .iter()
            .map(|p| DataPoint {
                date: p.date,
                value: p.value,
            })
            .collect()
    }
}

pub fn build_history(
    meter_id: impl Into<String>,
    unit: impl Into<String>,
    series: &ReadingSeries,
) -> ConsumptionHistory {
    let unit = unit.into();
    let mut deltas = period_deltas(series);
    for p in &mut deltas.points {
        p.label = Some(format_long(p.value, &unit));
    }

    let values = deltas.values();
    let t = totals(&values);
    let trend = classify_trend(&values);

    ConsumptionHistory {
        meter_id: meter_id.into(),
        unit,
        data: deltas.points,
        total_consumption: t.total,
        average_consumption: t.average,
        trend: trend.direction,
        change_percentage: trend.change_percentage,
        discontinuities: deltas.discontinuities,
        insufficient_data: t.is_insufficient(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::series::ReadingSample;
    use time::{macros::date, Date};

    fn monthly(values: &[f64]) -> ReadingSeries {
        let start = date!(2024 - 01 - 01);
        ReadingSeries::from_samples(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| ReadingSample {
                    date: start + time::Duration::days(30 * i as i64),
                    value,
                })
                .collect(),
        )
    }

    #[test]
    fn rising_readings_produce_upward_history() {
        let h = build_history("m-1", "kWh", &monthly(&[100.0, 120.0, 150.0, 200.0]));

        assert_eq!(h.values(), vec![20.0, 30.0, 50.0]);
        assert_eq!(h.total_consumption, 100.0);
        assert!((h.average_consumption - 33.333_333).abs() < 1e-5);
        assert_eq!(h.trend, TrendDirection::Up);
        assert!((h.change_percentage - 100.0).abs() < 1e-9);
        assert!(!h.insufficient_data);
        assert_eq!(h.data[2].label.as_deref(), Some("50.0 kWh"));
    }

    #[test]
    fn constant_readings_are_stable_at_zero() {
        let h = build_history("m-1", "m3", &monthly(&[500.0, 500.0, 500.0]));

        assert_eq!(h.values(), vec![0.0, 0.0]);
        assert_eq!(h.total_consumption, 0.0);
        assert_eq!(h.average_consumption, 0.0);
        assert_eq!(h.trend, TrendDirection::Stable);
        assert_eq!(h.change_percentage, 0.0);
    }

    #[test]
    fn short_sequences_degenerate_gracefully() {
        for values in [&[][..], &[42.0][..]] {
            let h = build_history("m-1", "kWh", &monthly(values));
            assert_eq!(h.average_consumption, 0.0);
            assert_eq!(h.trend, TrendDirection::Stable);
            assert_eq!(h.change_percentage, 0.0);
            assert!(h.insufficient_data);
        }
    }

    #[test]
    fn all_decreasing_readings_match_empty_result() {
        let h = build_history("m-1", "kWh", &monthly(&[300.0, 200.0, 100.0]));

        assert!(h.data.is_empty());
        assert_eq!(h.discontinuities, 2);
        assert_eq!(h.average_consumption, 0.0);
        assert_eq!(h.trend, TrendDirection::Stable);
        assert!(h.insufficient_data);
    }

    #[test]
    fn storage_order_input_gives_same_history() {
        let dates: Vec<Date> = (0..4)
            .map(|i| date!(2024 - 01 - 01) + time::Duration::days(30 * i))
            .collect();
        let newest_first = vec![
            ReadingSample {
                date: dates[3],
                value: 200.0,
            },
            ReadingSample {
                date: dates[2],
                value: 150.0,
            },
            ReadingSample {
                date: dates[1],
                value: 120.0,
            },
            ReadingSample {
                date: dates[0],
                value: 100.0,
            },
        ];

        let from_storage = build_history(
            "m-1",
            "kWh",
            &ReadingSeries::from_newest_first(newest_first.clone()),
        );
        let sorted = build_history("m-1", "kWh", &ReadingSeries::from_samples(newest_first));
        assert_eq!(from_storage, sorted);
    }
}
