use std::path::PathBuf;

use async_stream::stream;
use meter_client::domain::{Reading, ReadingStatus};
use time::Date;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use super::{in_range, synthetic_reading_id};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// NDJSON source for meter readings: one JSON object per line, blank lines skipped.
pub struct ReadingNdjsonFileSource {
    path: PathBuf,
    range: Option<(Date, Date)>,
}

#[derive(serde::Deserialize)]
struct IncomingReading {
    id: Option<String>,
    meter_id: String,
    value: f64,
    reading_date: Date,
    #[serde(default)]
    status: Option<ReadingStatus>,
}

impl From<IncomingReading> for Reading {
    fn from(i: IncomingReading) -> Self {
        let id = i
            .id
            .unwrap_or_else(|| synthetic_reading_id(&i.meter_id, i.reading_date));
        Reading {
            id,
            meter_id: i.meter_id,
            value: i.value,
            reading_date: i.reading_date,
            status: i.status.unwrap_or(ReadingStatus::Validated),
        }
    }
}

impl ReadingNdjsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            range: None,
        }
    }

    /// Only stream readings dated within `from..=to`.
    pub fn with_date_range(mut self, from: Date, to: Date) -> Self {
        self.range = Some((from, to));
        self
    }
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingNdjsonFileSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        let path = self.path.clone();
        let range = self.range;
        let s = stream! {
            let file = match File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!(
                        "failed to open {}: {e}",
                        path.display()
                    )));
                    return;
                }
            };
            let mut lines = BufReader::new(file).lines();

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(PipelineError::Source(format!("failed to read line: {e}")));
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                // A malformed line is reported and skipped; the rest of the file still streams.
                match serde_json::from_str::<IncomingReading>(&line) {
                    Ok(parsed) if !in_range(range, parsed.reading_date) => {
                        tracing::debug!(
                            meter_id = %parsed.meter_id,
                            reading_date = %parsed.reading_date,
                            "reading outside source range"
                        );
                    }
                    Ok(parsed) => {
                        yield Ok(Envelope::now(Reading::from(parsed)));
                    }
                    Err(e) => {
                        metrics::counter!("reading_ndjson_parse_errors_total").increment(1);
                        let message = format!("failed to parse reading line: {e}");
                        yield Err(PipelineError::Source(message));
                    }
                }
            }
        };

        Box::pin(s)
    }
}
