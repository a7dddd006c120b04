// Errors surfaced by the aggregation engine.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// A reading's `datetime` is not a valid ISO-8601 instant.
    #[error("invalid datetime {value:?}: {reason}")]
    Parse { value: String, reason: String },

    /// Unrecognized granularity name (caller or configuration bug).
    #[error("unknown granularity {0:?}; expected one of hourly, daily, weekly, monthly")]
    Config(String),
}
