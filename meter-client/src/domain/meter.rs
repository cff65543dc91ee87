use time::Date;

/// Utility a meter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[sqlx(type_name = "meter_kind", rename_all = "snake_case")]
pub enum MeterKind {
    Electricity,
    Gas,
    Water,
    Heat,
    ColdWater,
    HotWater,
    Solar,
    Other,
}

#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meter {
    pub id: String,
    pub kind: MeterKind,
    pub serial_number: String,
    pub unit_of_measure: String,
    pub last_value: Option<f64>,
    pub last_reading_date: Option<Date>,
}
