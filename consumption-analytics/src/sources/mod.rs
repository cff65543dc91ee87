pub mod questdb_readings;
pub mod reading_delimited_file;
pub mod reading_ndjson_file;

use std::collections::HashMap;

use anyhow::{bail, Result};
use meter_client::domain::Reading;
use sqlx::postgres::PgPoolOptions;
use time::Date;

use crate::{
    config::{AppConfig, SourceKind},
    pipeline::{EnvelopeStream, Source},
};

pub use questdb_readings::QuestDbReadingSource;
pub use reading_delimited_file::ReadingDelimitedFileSource;
pub use reading_ndjson_file::ReadingNdjsonFileSource;

/// Id given to readings whose input carries none.
pub(crate) fn synthetic_reading_id(meter_id: &str, reading_date: Date) -> String {
    format!("{meter_id}@{reading_date}")
}

/// `true` when there is no range or `date` falls inside it (both ends inclusive).
pub(crate) fn in_range(range: Option<(Date, Date)>, date: Date) -> bool {
    range.map_or(true, |(from, to)| from <= date && date <= to)
}

/// The reading source selected in configuration.
pub enum ReadingSource {
    Delimited(ReadingDelimitedFileSource),
    Ndjson(ReadingNdjsonFileSource),
    QuestDb(QuestDbReadingSource),
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        match self {
            Self::Delimited(s) => s.stream().await,
            Self::Ndjson(s) => s.stream().await,
            Self::QuestDb(s) => s.stream().await,
        }
    }
}

impl ReadingSource {
    /// Build the configured source. For the database source this also returns the
    /// unit of measure recorded for each selected meter.
    pub async fn from_config(cfg: &AppConfig) -> Result<(Self, HashMap<String, String>)> {
        let src = &cfg.source;
        let path = || match &src.path {
            Some(p) => Ok(p.clone()),
            None => Err(anyhow::anyhow!("source.path is required for {:?} sources", src.kind)),
        };

        let range = src.requested_range();

        match src.kind {
            SourceKind::Csv | SourceKind::Dat => {
                let mut source = if src.kind == SourceKind::Csv {
                    ReadingDelimitedFileSource::csv(path()?)
                } else {
                    ReadingDelimitedFileSource::dat(path()?)
                };
                if let Some((from, to)) = range {
                    source = source.with_date_range(from, to);
                }
                Ok((Self::Delimited(source), HashMap::new()))
            }
            SourceKind::Ndjson => {
                let mut source = ReadingNdjsonFileSource::new(path()?);
                if let Some((from, to)) = range {
                    source = source.with_date_range(from, to);
                }
                Ok((Self::Ndjson(source), HashMap::new()))
            }
            SourceKind::Pgwire => {
                let Some(questdb) = &cfg.questdb else {
                    bail!("[questdb] section is required for the pgwire source");
                };
                if src.meter_ids.is_empty() {
                    bail!("source.meter_ids must list at least one meter for the pgwire source");
                }

                let pool = PgPoolOptions::new()
                    .max_connections(questdb.max_connections)
                    .connect(&questdb.uri)
                    .await?;

                let meters = meter_client::db::meters_by_ids(&pool, &src.meter_ids).await?;
                let units = meters
                    .into_iter()
                    .map(|m| (m.id, m.unit_of_measure))
                    .collect();

                let (from, to) = src.date_range();
                let source = QuestDbReadingSource::new(pool, src.meter_ids.clone(), from, to);
                Ok((Self::QuestDb(source), units))
            }
        }
    }
}
