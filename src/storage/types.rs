//! Core data types for the analytics event store
//!
//! This module defines the fundamental types used throughout the storage layer:
//! - `AnalyticsEvent`: A stored, immutable analytics record
//! - `NewEvent`: An event waiting to be inserted (no id yet)
//! - `EventPredicate`: Typed WHERE clause shared by every query
//! - `BucketInterval`: Chart grouping granularity
//! - `Aggregate` and `ChartBucket`: Query results

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Regions the seeder draws from
pub const REGIONS: &[&str] = &[
    "North America",
    "Europe",
    "Asia",
    "South America",
    "Africa",
    "Oceania",
];

/// Product categories the seeder draws from
pub const CATEGORIES: &[&str] = &[
    "Electronics",
    "Clothing",
    "Books",
    "Home & Garden",
    "Sports",
    "Toys",
];

/// Traffic sources the seeder draws from
pub const SOURCES: &[&str] = &[
    "Direct",
    "Organic Search",
    "Paid Ads",
    "Social Media",
    "Email",
    "Referral",
];

const HOUR_MILLIS: i64 = 3_600_000;
const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Largest revenue magnitude a single event may carry
pub const MAX_REVENUE: f64 = 1e12;

/// `MAX_REVENUE` in cents
pub const MAX_REVENUE_CENTS: i64 = 100_000_000_000_000;

/// Convert a decimal currency amount to integer cents
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert to cents, or `None` when the amount is not finite or exceeds `MAX_REVENUE`
pub fn checked_cents(amount: f64) -> Option<i64> {
    if amount.is_finite() && amount.abs() <= MAX_REVENUE {
        Some(to_cents(amount))
    } else {
        None
    }
}

/// Convert integer cents back to a decimal currency amount
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Revenue is held as integer cents and travels over the wire as a decimal number.
mod cents {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::from_cents(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        super::checked_cents(amount).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "revenue must be a finite number no larger than {}",
                super::MAX_REVENUE
            ))
        })
    }
}

/// A single stored analytics record
///
/// Records are immutable once created; there is no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    /// UUID v4 assigned at insertion
    pub id: String,
    /// Event time (UTC, millisecond precision)
    pub timestamp: DateTime<Utc>,
    /// Revenue in cents
    #[serde(rename = "revenue", with = "cents")]
    pub revenue_cents: i64,
    pub users: u32,
    pub sessions: u32,
    /// Percentage, 0-100 by convention
    pub bounce_rate: f64,
    /// Percentage, 0-100 by convention
    pub conversion: f64,
    pub region: String,
    pub category: String,
    pub source: String,
}

impl AnalyticsEvent {
    /// Decimal revenue amount
    pub fn revenue(&self) -> f64 {
        from_cents(self.revenue_cents)
    }

    /// Event time as milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// An event that has not been stored yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "revenue", with = "cents")]
    pub revenue_cents: i64,
    pub users: u32,
    pub sessions: u32,
    pub bounce_rate: f64,
    pub conversion: f64,
    pub region: String,
    pub category: String,
    pub source: String,
}

impl NewEvent {
    /// Create an event with zeroed measures for the given dimensions
    pub fn new(
        timestamp: DateTime<Utc>,
        region: impl Into<String>,
        category: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            revenue_cents: 0,
            users: 0,
            sessions: 0,
            bounce_rate: 0.0,
            conversion: 0.0,
            region: region.into(),
            category: category.into(),
            source: source.into(),
        }
    }

    /// Builder: set revenue from a decimal amount
    pub fn revenue(mut self, amount: f64) -> Self {
        self.revenue_cents = to_cents(amount);
        self
    }

    /// Builder: set users and sessions
    pub fn traffic(mut self, users: u32, sessions: u32) -> Self {
        self.users = users;
        self.sessions = sessions;
        self
    }

    /// Builder: set bounce rate and conversion percentages
    pub fn rates(mut self, bounce_rate: f64, conversion: f64) -> Self {
        self.bounce_rate = bounce_rate;
        self.conversion = conversion;
        self
    }

    /// Attach an id, producing the stored form of this event
    pub fn into_event(self, id: String) -> AnalyticsEvent {
        AnalyticsEvent {
            id,
            // Storage keeps millisecond precision.
            timestamp: millis_to_datetime(self.timestamp.timestamp_millis()),
            revenue_cents: self.revenue_cents,
            users: self.users,
            sessions: self.sessions,
            bounce_rate: self.bounce_rate,
            conversion: self.conversion,
            region: self.region,
            category: self.category,
            source: self.source,
        }
    }
}

/// Convert epoch milliseconds to a UTC instant
///
/// Out-of-range values clamp to the epoch; they cannot be produced by the store.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

/// Typed WHERE clause over the event table
///
/// Every present constraint is ANDed; an absent field imposes no constraint.
/// Both time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPredicate {
    /// Lower time bound (inclusive), epoch ms
    pub start: Option<i64>,
    /// Upper time bound (inclusive), epoch ms
    pub end: Option<i64>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
}

impl EventPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, millis: i64) -> Self {
        self.start = Some(millis);
        self
    }

    pub fn end(mut self, millis: i64) -> Self {
        self.end = Some(millis);
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check if an event satisfies this predicate
    pub fn matches(&self, event: &AnalyticsEvent) -> bool {
        let ts = event.timestamp_millis();
        if self.start.is_some_and(|start| ts < start) {
            return false;
        }
        if self.end.is_some_and(|end| ts > end) {
            return false;
        }
        if self.region.as_deref().is_some_and(|r| r != event.region) {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| c != event.category) {
            return false;
        }
        if self.source.as_deref().is_some_and(|s| s != event.source) {
            return false;
        }
        true
    }
}

/// Granularity used to group events into chart buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketInterval {
    /// One bucket per distinct timestamp
    Timestamp,
    /// UTC hour
    Hour,
    /// UTC calendar day
    #[default]
    Day,
}

impl BucketInterval {
    /// Bucket width in milliseconds, `None` for exact-timestamp grouping
    pub fn width_millis(&self) -> Option<i64> {
        match self {
            BucketInterval::Timestamp => None,
            BucketInterval::Hour => Some(HOUR_MILLIS),
            BucketInterval::Day => Some(DAY_MILLIS),
        }
    }

    /// Start of the bucket containing `millis`
    pub fn bucket_start(&self, millis: i64) -> i64 {
        match self.width_millis() {
            Some(width) => millis - millis.rem_euclid(width),
            None => millis,
        }
    }
}

impl std::str::FromStr for BucketInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "timestamp" => Ok(BucketInterval::Timestamp),
            "hour" => Ok(BucketInterval::Hour),
            "day" => Ok(BucketInterval::Day),
            _ => Err(format!(
                "Invalid interval: {}. Use timestamp, hour, or day",
                s
            )),
        }
    }
}

impl std::fmt::Display for BucketInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketInterval::Timestamp => write!(f, "timestamp"),
            BucketInterval::Hour => write!(f, "hour"),
            BucketInterval::Day => write!(f, "day"),
        }
    }
}

/// Summary over a filtered set of events
///
/// An empty set yields all zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub total_revenue: f64,
    pub total_users: u64,
    pub total_sessions: u64,
    pub avg_bounce_rate: f64,
    pub avg_conversion: f64,
    pub unique_regions: u64,
    pub unique_categories: u64,
    pub unique_sources: u64,
}

/// Per-bucket aggregates for the chart series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartBucket {
    /// UTC calendar date of the bucket, `YYYY-MM-DD`
    pub date: String,
    /// Instant the bucket starts at
    pub bucket_start: DateTime<Utc>,
    pub revenue: f64,
    pub users: u64,
    pub sessions: u64,
    pub bounce_rate: f64,
    pub conversion: f64,
}

impl ChartBucket {
    /// Calendar-date label for a bucket key
    pub fn date_label(bucket_start: DateTime<Utc>) -> String {
        bucket_start.format("%Y-%m-%d").to_string()
    }
}

/// First instant of a UTC calendar day
pub fn day_start(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(millis: i64) -> AnalyticsEvent {
        NewEvent::new(millis_to_datetime(millis), "Europe", "Books", "Email")
            .revenue(12.5)
            .into_event("e1".to_string())
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(123.45), 12345);
        assert_eq!(to_cents(0.1 + 0.2), 30);
        assert_eq!(from_cents(12345), 123.45);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = event_at(1_704_067_200_000);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["revenue"], 12.5);
        assert_eq!(json["bounceRate"], 0.0);
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00Z");
        assert!(json.get("revenueCents").is_none());
    }

    #[test]
    fn test_new_event_deserialize() {
        let json = r#"{
            "timestamp": "2024-03-01T12:00:00Z",
            "revenue": 99.99,
            "users": 10,
            "sessions": 12,
            "bounceRate": 40.5,
            "conversion": 2.25,
            "region": "Asia",
            "category": "Toys",
            "source": "Direct"
        }"#;
        let event: NewEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.revenue_cents, 9999);
        assert_eq!(event.users, 10);

        let negative = json.replace("\"users\": 10", "\"users\": -1");
        assert!(serde_json::from_str::<NewEvent>(&negative).is_err());

        for huge in ["1e300", "60000000000000000", "1000000000000.01"] {
            let over = json.replace("99.99", huge);
            let err = serde_json::from_str::<NewEvent>(&over).unwrap_err();
            assert!(err.to_string().contains("revenue"), "{}", huge);
        }

        let at_cap = json.replace("99.99", "1000000000000");
        let event: NewEvent = serde_json::from_str(&at_cap).unwrap();
        assert_eq!(event.revenue_cents, MAX_REVENUE_CENTS);
    }

    #[test]
    fn test_checked_cents_bounds() {
        assert_eq!(checked_cents(12.34), Some(1234));
        assert_eq!(checked_cents(-MAX_REVENUE), Some(-MAX_REVENUE_CENTS));
        assert_eq!(checked_cents(MAX_REVENUE * 2.0), None);
        assert_eq!(checked_cents(f64::NAN), None);
        assert_eq!(checked_cents(f64::INFINITY), None);
    }

    #[test]
    fn test_predicate_inclusive_bounds() {
        let predicate = EventPredicate::new().start(1000).end(2000);

        assert!(!predicate.matches(&event_at(999)));
        assert!(predicate.matches(&event_at(1000)));
        assert!(predicate.matches(&event_at(2000)));
        assert!(!predicate.matches(&event_at(2001)));
    }

    #[test]
    fn test_predicate_dimensions() {
        let event = event_at(1000);

        assert!(EventPredicate::new().matches(&event));
        assert!(EventPredicate::new().region("Europe").matches(&event));
        assert!(!EventPredicate::new().region("Asia").matches(&event));
        assert!(!EventPredicate::new()
            .region("Europe")
            .source("Direct")
            .matches(&event));
    }

    #[test]
    fn test_bucket_start() {
        let ts = day_start(2024, 5, 17).unwrap().timestamp_millis() + 13 * HOUR_MILLIS + 42;

        assert_eq!(BucketInterval::Timestamp.bucket_start(ts), ts);
        assert_eq!(BucketInterval::Hour.bucket_start(ts), ts - 42);
        assert_eq!(
            BucketInterval::Day.bucket_start(ts),
            day_start(2024, 5, 17).unwrap().timestamp_millis()
        );
        // Pre-epoch instants still truncate downwards.
        assert_eq!(BucketInterval::Day.bucket_start(-1), -DAY_MILLIS);
    }

    #[test]
    fn test_bucket_interval_parse() {
        assert_eq!("day".parse::<BucketInterval>(), Ok(BucketInterval::Day));
        assert_eq!("HOUR".parse::<BucketInterval>(), Ok(BucketInterval::Hour));
        assert_eq!(
            "timestamp".parse::<BucketInterval>(),
            Ok(BucketInterval::Timestamp)
        );
        assert!("week".parse::<BucketInterval>().is_err());
        assert_eq!(BucketInterval::default(), BucketInterval::Day);
    }

    #[test]
    fn test_aggregate_default_is_zeroed() {
        let json = serde_json::to_value(Aggregate::default()).unwrap();
        assert_eq!(json["totalRevenue"], 0.0);
        assert_eq!(json["uniqueSources"], 0);
    }
}
