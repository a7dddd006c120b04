// Aggregated record: one row per non-empty calendar bucket.
// Same JSON shape as a raw Reading; `datetime` is the bucket start.

use serde::{Deserialize, Serialize};

use super::PropertyMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Bucket start, e.g. "2023-01-01T00:00:00.000Z".
    pub datetime: String,
    #[serde(flatten)]
    pub properties: PropertyMap,
}
