// Chart x-axis labels for bucket start instants.

use chrono::TimeDelta;

use crate::aggregation::Granularity;
use crate::aggregation::calendar::parse_instant;

const DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Label for a bucket starting at `datetime`:
/// hourly "14:00", daily "1/31/2024", weekly "1/28/2024 - 2/3/2024", monthly "Jan 2024".
/// Unparseable input is returned unchanged.
pub fn format_label(datetime: &str, granularity: Granularity) -> String {
    let Ok(t) = parse_instant(datetime) else {
        return datetime.to_string();
    };
    match granularity {
        Granularity::Hourly => t.format("%H:%M").to_string(),
        Granularity::Daily => t.format(DATE_FORMAT).to_string(),
        Granularity::Weekly => format!(
            "{} - {}",
            t.format(DATE_FORMAT),
            (t + TimeDelta::days(6)).format(DATE_FORMAT)
        ),
        Granularity::Monthly => t.format("%b %Y").to_string(),
    }
}
