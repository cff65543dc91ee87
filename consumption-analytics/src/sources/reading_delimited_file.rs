use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use meter_client::domain::{Reading, ReadingStatus};
use time::{macros::format_description, Date};

use super::{in_range, synthetic_reading_id};
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Delimited-file source for meter readings.
///
/// Expected header columns (by name):
/// - meter_id
/// - value (cumulative meter value)
/// - reading_date (`YYYY-MM-DD`)
/// - id (optional, derived from meter and date when absent)
/// - status (optional, defaults to `validated`)
///
/// `.csv` exports are comma separated, `.dat` exports use `|`.
pub struct ReadingDelimitedFileSource {
    path: PathBuf,
    delimiter: u8,
    range: Option<(Date, Date)>,
}

impl ReadingDelimitedFileSource {
    pub fn csv<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            range: None,
        }
    }

    pub fn dat<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            delimiter: b'|',
            range: None,
        }
    }

    /// Only stream readings dated within `from..=to`.
    pub fn with_date_range(mut self, from: Date, to: Date) -> Self {
        self.range = Some((from, to));
        self
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub(crate) fn parse_reading_date(s: &str) -> Result<Date, PipelineError> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| PipelineError::Source(format!("invalid reading_date '{s}': {e}")))
}

fn record_to_reading(
    record: &StringRecord,
    headers: &StringRecord,
) -> Result<Reading, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in record")))
    };

    let meter_id = non_empty(get("meter_id")?)
        .ok_or_else(|| PipelineError::Source("empty meter_id".to_string()))?
        .to_string();

    let value_str = get("value")?;
    let value: f64 = value_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid value '{value_str}': {e}")))?;

    let reading_date = parse_reading_date(get("reading_date")?)?;

    let status = match get("status").ok().and_then(non_empty) {
        Some(s) => s
            .parse::<ReadingStatus>()
            .map_err(|e| PipelineError::Source(e.to_string()))?,
        None => ReadingStatus::Validated,
    };

    let id = get("id")
        .ok()
        .and_then(non_empty)
        .map(str::to_string)
        .unwrap_or_else(|| synthetic_reading_id(&meter_id, reading_date));

    Ok(Reading {
        id,
        meter_id,
        value,
        reading_date,
        status,
    })
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingDelimitedFileSource {
    async fn stream(&self) -> EnvelopeStream<Reading> {
        // Blocking reader inside a single task; exports are small.
        let path = self.path.clone();
        let delimiter = self.delimiter;
        let range = self.range;
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!(
                        "failed to open {}: {e}",
                        path.display()
                    )));
                    return;
                }
            };
            let mut rdr = csv::ReaderBuilder::new().delimiter(delimiter).from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to read headers: {e}")));
                    return;
                }
            };

            for result in rdr.records() {
                let parsed = result
                    .map_err(|e| PipelineError::Source(format!("failed to read record: {e}")))
                    .and_then(|record| record_to_reading(&record, &headers));

                match parsed {
                    Ok(reading) if !in_range(range, reading.reading_date) => {
                        tracing::debug!(
                            meter_id = %reading.meter_id,
                            reading_date = %reading.reading_date,
                            "reading outside source range"
                        );
                    }
                    Ok(reading) => {
                        yield Ok(Envelope::now(reading));
                    }
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        yield Err(e);
                    }
                }
            }
        };

        Box::pin(s)
    }
}
