pub mod comparison_chart;
pub mod consumption_report;

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use futures::{Stream, StreamExt};
use meter_client::domain::Reading;
use tokio::io::AsyncWriteExt;

use crate::{
    analytics::{build_history, ConsumptionHistory, ReadingSeries, StatusFilter},
    pipeline::{Envelope, PipelineError},
};

pub use comparison_chart::{ComparisonChartSink, ComparisonReport};
pub use consumption_report::{ConsumptionReportSink, MeterReport, ReportOptions};

/// Resolves the unit of measure for a meter, falling back to a default.
#[derive(Debug, Clone, Default)]
pub struct UnitLookup {
    default_unit: String,
    by_meter: HashMap<String, String>,
}

impl UnitLookup {
    pub fn new(default_unit: impl Into<String>) -> Self {
        Self {
            default_unit: default_unit.into(),
            by_meter: HashMap::new(),
        }
    }

    /// Later entries override earlier ones for the same meter.
    pub fn with_units<I>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.by_meter.extend(units);
        self
    }

    pub fn unit_for(&self, meter_id: &str) -> &str {
        self.by_meter
            .get(meter_id)
            .map(String::as_str)
            .unwrap_or(&self.default_unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutput {
    Stdout,
    File(PathBuf),
}

impl ReportOutput {
    pub fn from_path(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.trim().is_empty() && p != "-" => Self::File(PathBuf::from(p)),
            _ => Self::Stdout,
        }
    }

    pub async fn write(&self, bytes: &[u8]) -> Result<(), PipelineError> {
        let res = match self {
            Self::Stdout => {
                let mut out = tokio::io::stdout();
                match out.write_all(bytes).await {
                    Ok(()) => out.flush().await,
                    Err(e) => Err(e),
                }
            }
            Self::File(path) => tokio::fs::write(path, bytes).await,
        };
        res.map_err(|e| PipelineError::Sink(format!("failed to write report: {e}")))
    }
}

/// Readings drained from a pipeline, grouped by meter.
#[derive(Debug, Default)]
pub(crate) struct CollectedReadings {
    pub by_meter: BTreeMap<String, Vec<Reading>>,
    pub accepted: usize,
    pub skipped: usize,
}

impl CollectedReadings {
    /// One history per meter, in meter id order.
    pub fn histories(&self, units: &UnitLookup, filter: StatusFilter) -> Vec<ConsumptionHistory> {
        self.by_meter
            .iter()
            .map(|(meter_id, readings)| {
                let series = ReadingSeries::from_readings(readings, filter);
                let history = build_history(meter_id.as_str(), units.unit_for(meter_id), &series);
                if history.discontinuities > 0 {
                    tracing::info!(
                        meter_id = %meter_id,
                        discontinuities = history.discontinuities,
                        "meter value decreased between readings; periods excluded"
                    );
                    metrics::counter!("consumption_discontinuities_total")
                        .increment(history.discontinuities as u64);
                }
                history
            })
            .collect()
    }
}

/// Drain the stream. Errors from upstream are logged and counted, never fatal.
/// A non-empty `meter_filter` restricts collection to those meters.
pub(crate) async fn collect_readings<S>(mut input: S, meter_filter: &[String]) -> CollectedReadings
where
    S: Stream<Item = Result<Envelope<Reading>, PipelineError>> + Unpin,
{
    let mut out = CollectedReadings::default();

    while let Some(item) = input.next().await {
        match item {
            Ok(env) => {
                let reading = env.payload;
                if !meter_filter.is_empty() && !meter_filter.contains(&reading.meter_id) {
                    tracing::debug!(
                        meter_id = %reading.meter_id,
                        "reading for unselected meter ignored"
                    );
                    out.skipped += 1;
                    continue;
                }
                out.by_meter
                    .entry(reading.meter_id.clone())
                    .or_default()
                    .push(reading);
                out.accepted += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping reading");
                out.skipped += 1;
            }
        }
    }

    out
}
