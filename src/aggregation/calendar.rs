// Calendar buckets (hour/day/week/month) in UTC, plus ISO-8601 parse/format helpers.
// Every instant belongs to exactly one bucket: [bucket_start, next_bucket_start - 1ms].

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, Timelike,
    Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use crate::error::AggregationError;

/// Bucket size selector; serializes lowercase ("hourly").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Hourly,
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    /// Calendar for this granularity. `week_start` only matters for Weekly.
    pub fn calendar(self, week_start: Weekday) -> Box<dyn CalendarGranularity> {
        match self {
            Granularity::Hourly => Box::new(Hourly),
            Granularity::Daily => Box::new(Daily),
            Granularity::Weekly => Box::new(Weekly {
                starts_on: week_start,
            }),
            Granularity::Monthly => Box::new(Monthly),
        }
    }
}

impl FromStr for Granularity {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Granularity::Hourly),
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(AggregationError::Config(other.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar-aligned bucketing for one granularity.
pub trait CalendarGranularity: Send + Sync {
    /// Start of the bucket containing `t`.
    fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc>;

    /// Start of the bucket following the one containing `t`.
    fn next_bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc>;

    /// Last millisecond of the bucket containing `t`.
    fn bucket_end(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.next_bucket_start(t) - TimeDelta::milliseconds(1)
    }

    /// Inclusive on both ends.
    fn contains(&self, t: DateTime<Utc>, bucket_start: DateTime<Utc>) -> bool {
        bucket_start <= t && t <= self.bucket_end(bucket_start)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hourly;

#[derive(Debug, Clone, Copy, Default)]
pub struct Daily;

#[derive(Debug, Clone, Copy)]
pub struct Weekly {
    pub starts_on: Weekday,
}

impl Default for Weekly {
    fn default() -> Self {
        Weekly {
            starts_on: Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Monthly;

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(i64::from(date.day0()))
}

impl CalendarGranularity for Hourly {
    fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        midnight(t.date_naive()) + TimeDelta::hours(i64::from(t.hour()))
    }

    fn next_bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.bucket_start(t) + TimeDelta::hours(1)
    }
}

impl CalendarGranularity for Daily {
    fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        midnight(t.date_naive())
    }

    fn next_bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.bucket_start(t) + TimeDelta::days(1)
    }
}

impl CalendarGranularity for Weekly {
    fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let date = t.date_naive();
        let offset = (date.weekday().num_days_from_monday() + 7
            - self.starts_on.num_days_from_monday())
            % 7;
        midnight(date - TimeDelta::days(i64::from(offset)))
    }

    fn next_bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.bucket_start(t) + TimeDelta::days(7)
    }
}

impl CalendarGranularity for Monthly {
    fn bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        midnight(first_of_month(t.date_naive()))
    }

    fn next_bucket_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        // 32 days past the 1st always lands in the next month.
        let later = first_of_month(t.date_naive()) + TimeDelta::days(32);
        midnight(first_of_month(later))
    }
}

/// Every bucket start from the bucket containing `start` through the one containing `end`.
pub fn each_bucket<'a>(
    calendar: &'a dyn CalendarGranularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = DateTime<Utc>> + 'a {
    let first = calendar.bucket_start(start);
    std::iter::successors(Some(first), move |&current| {
        let next = calendar.next_bucket_start(current);
        (next > current && next <= end).then_some(next)
    })
    .take_while(move |&b| b <= end)
}

/// Week starts covering the first of the month four months before `t`
/// through the end of `t`'s month.
pub fn weeks_in_last_four_months(
    t: DateTime<Utc>,
    starts_on: Weekday,
) -> Vec<DateTime<Utc>> {
    let mut start = Monthly.bucket_start(t);
    for _ in 0..4 {
        start = Monthly.bucket_start(start - TimeDelta::milliseconds(1));
    }
    let end = Monthly.bucket_end(t);
    each_bucket(&Weekly { starts_on }, start, end).collect()
}

/// Parse an ISO-8601 instant. Accepts RFC 3339, a naive date-time (read as UTC), or a bare date.
/// Sub-millisecond precision is dropped.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, AggregationError> {
    let parsed = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(rfc_err) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(midnight))
            .map_err(|_| AggregationError::Parse {
                value: s.to_string(),
                reason: rfc_err.to_string(),
            })?,
    };
    let millis = parsed.nanosecond() / 1_000_000 * 1_000_000;
    Ok(parsed.with_nanosecond(millis).unwrap_or(parsed))
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. "2023-01-01T00:00:00.000Z".
pub fn format_instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}
