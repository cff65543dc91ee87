//! Consumption and trend analytics over meter readings.
//!
//! Everything here is a pure function of its input: no I/O, no shared state,
//! nothing cached between calls.

pub mod aggregate;
pub mod anomaly;
pub mod chart;
pub mod comparison;
pub mod format;
pub mod history;
pub mod series;
pub mod trend;

pub use aggregate::{ConsumptionDataPoint, ConsumptionTotals, MonthlyConsumption};
pub use anomaly::{ConsumptionAnomaly, ReadingValidationRule};
pub use chart::{ChartPoint, ComparisonChart, DataPoint, Series, SeriesGeometry, YDomain};
pub use comparison::ConsumptionComparison;
pub use history::{build_history, ConsumptionHistory};
pub use series::{ReadingSample, ReadingSeries, StatusFilter};
pub use trend::{TrendDirection, TrendSummary, TREND_DEADBAND_PERCENT};
