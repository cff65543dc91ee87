pub mod reading_queries;

pub use reading_queries::{meters_by_ids, readings_for_meters};
