use meter_client::{db, domain::Reading};
use sqlx::PgPool;
use time::Date;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Reads meter readings over the Postgres wire protocol for a fixed set of meters
/// and an inclusive date range.
pub struct QuestDbReadingSource {
    pool: PgPool,
    meter_ids: Vec<String>,
    from: Date,
    to: Date,
}

impl QuestDbReadingSource {
    pub fn new(pool: PgPool, meter_ids: Vec<String>, from: Date, to: Date) -> Self {
        Self {
            pool,
            meter_ids,
            from,
            to,
        }
    }
}

#[async_trait::async_trait]
impl Source<Reading> for QuestDbReadingSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        let pool = self.pool.clone();
        let meter_ids = self.meter_ids.clone();
        let (from, to) = (self.from, self.to);

        let s = async_stream::try_stream! {
            let rows = db::readings_for_meters(&pool, &meter_ids, from, to)
                .await
                .map_err(|e| PipelineError::Source(format!("failed to query readings: {e}")))?;
            tracing::info!(
                rows = rows.len(),
                meters = meter_ids.len(),
                "loaded readings from questdb"
            );

            for reading in rows {
                yield Envelope::now(reading);
            }
        };

        Box::pin(s)
    }
}
