// Domain models: raw sensor readings and the per-bucket records built from them.

mod aggregated;
mod reading;

pub use aggregated::AggregatedRecord;
pub use reading::{AggregatorKind, ChartStyle, PropertyEntry, PropertyMap, Reading};
