use meter_client::domain::Reading;
use time::{macros::date, Date};

use crate::pipeline::{Envelope, PipelineError, Transform};

/// Earliest reading date accepted by validation.
pub const MIN_READING_DATE: Date = date!(2000 - 01 - 01);
/// Latest reading date accepted by validation.
pub const MAX_READING_DATE: Date = date!(2100 - 01 - 01);

/// Pure validation of a `Reading`.
///
/// Rules:
/// - meter_id must be non-empty.
/// - value must be finite and non-negative (meters count up from zero).
/// - reading_date must be within [2000-01-01, 2100-01-01].
pub fn validate_reading(env: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
    let r = &env.payload;

    if r.meter_id.trim().is_empty() {
        return Err(PipelineError::Transform(format!("reading {} has no meter_id", r.id)));
    }

    if !r.value.is_finite() || r.value < 0.0 {
        return Err(PipelineError::Transform(format!(
            "reading {} value must be a non-negative number, got {}",
            r.id, r.value
        )));
    }

    if r.reading_date < MIN_READING_DATE || r.reading_date > MAX_READING_DATE {
        return Err(PipelineError::Transform(format!(
            "reading {} date {} out of allowed range",
            r.id, r.reading_date
        )));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<Reading, Reading> for ReadingValidation {
    async fn apply(&self, input: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("readings_validation_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
