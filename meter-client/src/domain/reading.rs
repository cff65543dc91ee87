use std::{fmt, str::FromStr};

use time::Date;

/// Review state of a submitted reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[sqlx(type_name = "reading_status", rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    Pending,
    Validated,
    Rejected,
    Corrected,
}

impl ReadingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
            Self::Corrected => "corrected",
        }
    }

    /// Whether a reviewer has accepted the value, either as submitted or after correction.
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Validated | Self::Corrected)
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown reading status '{0}'")]
pub struct ParseReadingStatusError(pub String);

impl FromStr for ReadingStatus {
    type Err = ParseReadingStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "validated" => Ok(Self::Validated),
            "rejected" => Ok(Self::Rejected),
            "corrected" => Ok(Self::Corrected),
            other => Err(ParseReadingStatusError(other.to_string())),
        }
    }
}

/// A cumulative meter value reported on a given day.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub id: String,
    pub meter_id: String,
    pub value: f64,
    pub reading_date: Date,
    pub status: ReadingStatus,
}
