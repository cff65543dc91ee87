//! Chronological ordering boundary for reading sequences.
//!
//! Readings are stored and listed newest-first, while every consumption
//! computation walks them oldest-first. `ReadingSeries` is the only way into
//! the aggregation code, so the ordering is decided once, here.

use meter_client::domain::{Reading, ReadingStatus};
use serde::Serialize;
use time::Date;

/// Cumulative meter value on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingSample {
    pub date: Date,
    pub value: f64,
}

impl From<&Reading> for ReadingSample {
    fn from(r: &Reading) -> Self {
        Self {
            date: r.reading_date,
            value: r.value,
        }
    }
}

/// Which review states contribute to consumption.
///
/// Confirmed readings (validated or corrected) always count, rejected ones
/// never do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFilter {
    pub include_pending: bool,
}

impl StatusFilter {
    pub fn accepts(&self, status: ReadingStatus) -> bool {
        status.is_confirmed() || (self.include_pending && status == ReadingStatus::Pending)
    }
}

/// Readings of one meter, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingSeries {
    samples: Vec<ReadingSample>,
}

impl ReadingSeries {
    /// Sorts by date. The sort is stable, so same-day samples keep their input order.
    pub fn from_samples(mut samples: Vec<ReadingSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self { samples }
    }

    /// Takes samples in storage order (newest first) and reverses them.
    pub fn from_newest_first(mut samples: Vec<ReadingSample>) -> Self {
        samples.reverse();
        Self { samples }
    }

    pub fn from_readings<'a, I>(readings: I, filter: StatusFilter) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let samples = readings
            .into_iter()
            .filter(|r| filter.accepts(r.status))
            .map(ReadingSample::from)
            .collect();
        Self::from_samples(samples)
    }

    pub fn samples(&self) -> &[ReadingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
