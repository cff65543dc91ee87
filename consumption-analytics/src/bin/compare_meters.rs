use anyhow::{bail, Result};
use consumption_analytics::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::{ComparisonChartSink, ReportOutput, UnitLookup},
    sources::ReadingSource,
    transform,
};
use meter_client::domain::Reading;
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let mut cfg = AppConfig::load()?;

    // Meter ids on the command line replace the configured selection.
    let args: Vec<String> = env::args().skip(1).collect();
    if !args.is_empty() {
        cfg.source.meter_ids = args;
    }
    if cfg.source.meter_ids.len() == 1 {
        bail!("usage: compare_meters [meter_id meter_id ...] (at least two meters to compare)");
    }

    let (source, db_units) = ReadingSource::from_config(&cfg).await?;
    let units = UnitLookup::new(cfg.report.default_unit.clone())
        .with_units(db_units)
        .with_units(cfg.meter_units());

    let sink = ComparisonChartSink::new(
        ReportOutput::from_path(cfg.comparison.output_path.as_deref()),
        units,
        cfg.status_filter(),
        cfg.source.meter_ids.clone(),
        cfg.comparison.y_domain,
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
        "meter comparison complete"
    );

    Ok(())
}
