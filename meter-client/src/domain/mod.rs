mod meter;
mod reading;

pub use meter::{Meter, MeterKind};
pub use reading::{ParseReadingStatusError, Reading, ReadingStatus};
