use std::collections::HashMap;

use futures::Stream;
use meter_client::domain::Reading;
use serde::Serialize;

use super::{collect_readings, ReportOutput, UnitLookup};
use crate::{
    analytics::{
        aggregate::monthly_consumption,
        anomaly::detect_anomalies,
        chart::map_series,
        comparison::{compare, reference_average},
        ConsumptionAnomaly, ConsumptionComparison, ConsumptionHistory, MonthlyConsumption,
        ReadingValidationRule, SeriesGeometry, StatusFilter,
    },
    pipeline::{Envelope, PipelineError, Sink, SinkSummary},
};

/// Everything derived for one meter, written as a single NDJSON line.
#[derive(Debug, Clone, Serialize)]
pub struct MeterReport {
    pub history: ConsumptionHistory,
    pub monthly: Vec<MonthlyConsumption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ConsumptionComparison>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<ConsumptionAnomaly>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<SeriesGeometry>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub include_chart: bool,
    pub rule: Option<ReadingValidationRule>,
}

/// Build reports for a set of histories.
///
/// Meters sharing a unit are each other's peers: with two or more of them the
/// pooled peer average becomes the comparison reference.
pub fn build_reports(
    histories: Vec<ConsumptionHistory>,
    options: &ReportOptions,
) -> Vec<MeterReport> {
    let mut peers: HashMap<&str, Vec<&ConsumptionHistory>> = HashMap::new();
    for h in &histories {
        peers.entry(h.unit.as_str()).or_default().push(h);
    }
    let references: HashMap<String, f64> = peers
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .filter_map(|(unit, group)| reference_average(group).map(|avg| (unit.to_string(), avg)))
        .collect();

    histories
        .into_iter()
        .map(|history| {
            let reference = references.get(&history.unit).copied();
            let anomalies = options
                .rule
                .as_ref()
                .map(|rule| detect_anomalies(&history, rule))
                .unwrap_or_default();
            MeterReport {
                monthly: monthly_consumption(&history.data),
                comparison: compare(&history, reference),
                anomalies,
                chart: options
                    .include_chart
                    .then(|| map_series(&history.chart_points())),
                history,
            }
        })
        .collect()
}

/// Writes one `MeterReport` per meter once the input stream is exhausted.
pub struct ConsumptionReportSink {
    output: ReportOutput,
    units: UnitLookup,
    status_filter: StatusFilter,
    meter_filter: Vec<String>,
    options: ReportOptions,
}

impl ConsumptionReportSink {
    pub fn new(
        output: ReportOutput,
        units: UnitLookup,
        status_filter: StatusFilter,
        meter_filter: Vec<String>,
        options: ReportOptions,
    ) -> Self {
        Self {
            output,
            units,
            status_filter,
            meter_filter,
            options,
        }
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for ConsumptionReportSink {
    async fn run<S>(&self, input: S) -> Result<SinkSummary, PipelineError>
    where
        S: Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        let collected = collect_readings(input, &self.meter_filter).await;
        let histories = collected.histories(&self.units, self.status_filter);
        let reports = build_reports(histories, &self.options);

        let mut buf = Vec::new();
        for report in &reports {
            tracing::info!(
                meter_id = %report.history.meter_id,
                total = report.history.total_consumption,
                trend = ?report.history.trend,
                change_pct = report.history.change_percentage,
                anomalies = report.anomalies.len(),
                "consumption report built"
            );
            metrics::counter!("consumption_anomalies_total")
                .increment(report.anomalies.len() as u64);

            serde_json::to_writer(&mut buf, report)
                .map_err(|e| PipelineError::Sink(format!("failed to encode report: {e}")))?;
            buf.push(b'\n');
        }

        self.output.write(&buf).await?;
        metrics::counter!("consumption_reports_written_total").increment(reports.len() as u64);

        Ok(SinkSummary {
            accepted: collected.accepted,
            skipped: collected.skipped,
            reports_written: reports.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{build_history, ReadingSample, ReadingSeries, TrendDirection};
    use meter_client::domain::ReadingStatus;
    use time::{macros::date, Date};

    fn history(meter_id: &str, unit: &str, values: &[f64]) -> ConsumptionHistory {
        let start = date!(2024 - 01 - 01);
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &value)| ReadingSample {
                date: start + time::Duration::days(31 * i as i64),
                value,
            })
            .collect();
        build_history(meter_id, unit, &ReadingSeries::from_samples(samples))
    }

    #[test]
    fn peers_with_same_unit_share_a_reference() {
        let reports = build_reports(
            vec![
                history("e-1", "kWh", &[0.0, 10.0, 20.0]),
                history("e-2", "kWh", &[0.0, 30.0]),
                history("w-1", "m3", &[0.0, 5.0]),
            ],
            &ReportOptions::default(),
        );

        let e1 = reports[0].comparison.unwrap();
        assert_eq!(e1.reference_average, Some(50.0 / 3.0));
        // lone meter with its unit has no peer reference
        let w1 = reports[2].comparison.unwrap();
        assert!(w1.reference_average.is_none());
        assert!(reports.iter().all(|r| r.chart.is_none()));
    }

    #[test]
    fn rule_and_chart_are_optional_extras() {
        let options = ReportOptions {
            include_chart: true,
            rule: Some(ReadingValidationRule {
                max_consumption: Some(25.0),
                ..Default::default()
            }),
        };
        let reports = build_reports(vec![history("e-1", "kWh", &[0.0, 10.0, 40.0])], &options);

        let r = &reports[0];
        assert_eq!(r.anomalies.len(), 1);
        assert_eq!(r.anomalies[0].consumption, 30.0);
        assert_eq!(r.chart.as_ref().unwrap().points.len(), 2);
        assert!(!r.chart.as_ref().unwrap().polyline.is_empty());
        assert_eq!(r.monthly.len(), 2);
    }

    fn envelope(
        meter_id: &str,
        value: f64,
        reading_date: Date,
        status: ReadingStatus,
    ) -> Result<Envelope<Reading>, PipelineError> {
        Ok(Envelope::now(Reading {
            id: format!("{meter_id}@{reading_date}"),
            meter_id: meter_id.to_string(),
            value,
            reading_date,
            status,
        }))
    }

    #[tokio::test]
    async fn sink_writes_one_line_per_meter() {
        let path = std::env::temp_dir()
            .join(format!("consumption-report-{}.ndjson", std::process::id()));
        let sink = ConsumptionReportSink::new(
            ReportOutput::File(path.clone()),
            UnitLookup::new("kWh"),
            StatusFilter::default(),
            Vec::new(),
            ReportOptions::default(),
        );

        // newest first, as readings are listed
        let input = futures::stream::iter(vec![
            envelope("m-1", 200.0, date!(2024 - 04 - 01), ReadingStatus::Validated),
            envelope("m-1", 150.0, date!(2024 - 03 - 01), ReadingStatus::Validated),
            envelope("m-1", 120.0, date!(2024 - 02 - 01), ReadingStatus::Corrected),
            envelope("m-1", 100.0, date!(2024 - 01 - 01), ReadingStatus::Validated),
            envelope("m-2", 10.0, date!(2024 - 01 - 01), ReadingStatus::Validated),
            envelope("m-2", 99.0, date!(2024 - 02 - 01), ReadingStatus::Rejected),
        ]);

        let summary = sink.run(input).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.accepted, 6);
        assert_eq!(summary.reports_written, 2);

        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["history"]["meter_id"], "m-1");
        assert_eq!(lines[0]["history"]["total_consumption"], 100.0);
        assert_eq!(lines[0]["history"]["trend"], "up");
        assert_eq!(lines[0]["history"]["data"][0]["date"], "2024-02-01");
        assert_eq!(lines[1]["history"]["insufficient_data"], true);
        assert_eq!(lines[1]["history"]["trend"], serde_json::json!(TrendDirection::Stable));
    }
}
