use futures::Stream;
use meter_client::domain::Reading;
use serde::Serialize;

use super::{collect_readings, ReportOutput, UnitLookup};
use crate::{
    analytics::{
        chart::map_comparison, ComparisonChart, ConsumptionHistory, Series, StatusFilter, YDomain,
    },
    pipeline::{Envelope, PipelineError, Sink, SinkSummary},
};

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub histories: Vec<ConsumptionHistory>,
    pub chart: ComparisonChart,
}

pub fn build_comparison(histories: Vec<ConsumptionHistory>, y_domain: YDomain) -> ComparisonReport {
    let series: Vec<Series> = histories
        .iter()
        .map(|h| Series {
            key: h.meter_id.clone(),
            points: h.chart_points(),
        })
        .collect();

    ComparisonReport {
        chart: map_comparison(&series, y_domain),
        histories,
    }
}

/// Overlays the consumption of several meters on one date axis.
pub struct ComparisonChartSink {
    output: ReportOutput,
    units: UnitLookup,
    status_filter: StatusFilter,
    meter_filter: Vec<String>,
    y_domain: YDomain,
}

impl ComparisonChartSink {
    pub fn new(
        output: ReportOutput,
        units: UnitLookup,
        status_filter: StatusFilter,
        meter_filter: Vec<String>,
        y_domain: YDomain,
    ) -> Self {
        Self {
            output,
            units,
            status_filter,
            meter_filter,
            y_domain,
        }
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for ComparisonChartSink {
    async fn run<S>(&self, input: S) -> Result<SinkSummary, PipelineError>
    where
        S: Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        let collected = collect_readings(input, &self.meter_filter).await;
        let histories = collected.histories(&self.units, self.status_filter);

        if self.y_domain == YDomain::Shared {
            let mut units: Vec<&str> = histories.iter().map(|h| h.unit.as_str()).collect();
            units.sort_unstable();
            units.dedup();
            if units.len() > 1 {
                tracing::warn!(units = ?units, "shared y axis across meters with different units");
            }
        }

        let report = build_comparison(histories, self.y_domain);
        let body = serde_json::to_vec_pretty(&report)
            .map_err(|e| PipelineError::Sink(format!("failed to encode comparison: {e}")))?;
        self.output.write(&body).await?;

        tracing::info!(
            meters = report.histories.len(),
            dates = report.chart.dates.len(),
            "comparison chart written"
        );
        metrics::counter!("consumption_reports_written_total").increment(1);

        Ok(SinkSummary {
            accepted: collected.accepted,
            skipped: collected.skipped,
            reports_written: 1,
        })
    }
}
