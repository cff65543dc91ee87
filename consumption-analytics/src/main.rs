use anyhow::Result;
use consumption_analytics::{
    config::AppConfig,
    metrics_server, observability,
    pipeline::Pipeline,
    sinks::{ConsumptionReportSink, ReportOptions, ReportOutput, UnitLookup},
    sources::ReadingSource,
    transform,
};
use meter_client::domain::Reading;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let (source, db_units) = ReadingSource::from_config(&cfg).await?;
    let units = UnitLookup::new(cfg.report.default_unit.clone())
        .with_units(db_units)
        .with_units(cfg.meter_units());

    let sink = ConsumptionReportSink::new(
        ReportOutput::from_path(cfg.report.output_path.as_deref()),
        units,
        cfg.status_filter(),
        cfg.source.meter_ids.clone(),
        ReportOptions {
            include_chart: cfg.report.include_chart,
            rule: cfg.validation.clone(),
        },
    );

    let pipeline: Pipeline<_, Reading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::ReadingValidation)],
        sink,
    };

    let summary = pipeline.run().await?;
    tracing::info!(
        accepted = summary.accepted,
        skipped = summary.skipped,
        reports = summary.reports_written,
        "consumption reports complete"
    );

    Ok(())
}
