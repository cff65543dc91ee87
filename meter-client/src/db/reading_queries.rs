use anyhow::Result;
use sqlx::PgPool;
use time::Date;

use crate::domain::{Meter, Reading};

/// Fetch readings for several meters at once, grouped by meter and ordered by date
/// within each meter.
///
/// Both bounds are inclusive, matching how billing periods are expressed.
pub async fn readings_for_meters(
    pool: &PgPool,
    meter_ids: &[String],
    from: Date,
    to: Date,
) -> Result<Vec<Reading>> {
    let rows = sqlx::query_as::<_, Reading>(
        r#"
        SELECT
            id,
            meter_id,
            value,
            reading_date,
            status
        FROM meter_readings
        WHERE meter_id = ANY($1)
          AND reading_date >= $2
          AND reading_date <= $3
        ORDER BY meter_id, reading_date
        "#,
    )
    .bind(meter_ids)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Look up meter metadata (notably the unit of measure) for the given ids.
pub async fn meters_by_ids(pool: &PgPool, meter_ids: &[String]) -> Result<Vec<Meter>> {
    let rows = sqlx::query_as::<_, Meter>(
        r#"
        SELECT
            id,
            kind,
            serial_number,
            unit_of_measure,
            last_value,
            last_reading_date
        FROM meters
        WHERE id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(meter_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
