//! Trend Aggregator
//!
//! Buckets reviews by calendar day and turns per-day sentiment counts into
//! percentage distributions, ordered chronologically.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use report_core::{Sentiment, TrendPoint};
use serde_json::Value;
use std::collections::HashMap;

use crate::normalizer::sentiment_of;

/// Label for reviews whose date is present but cannot be parsed
pub const UNKNOWN_DATE: &str = "Unknown Date";

const LABEL_FORMAT: &str = "%b %-d, %Y";
const DATE_FIELDS: [&str; 4] = ["date", "created_at", "createdAt", "timestamp"];

/// Outcome of reading a review's date field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDate {
    /// No date supplied; bucketed under the processing day
    Absent,
    Parsed(NaiveDate),
    Invalid,
}

#[derive(Debug, Default)]
struct Bucket {
    /// Ordering key; `None` for the unknown-date bucket
    day: Option<NaiveDate>,
    label: String,
    positive: u32,
    neutral: u32,
    negative: u32,
}

impl Bucket {
    fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }

    fn to_point(&self) -> TrendPoint {
        let total = self.total().max(1) as f64;
        TrendPoint {
            date: self.label.clone(),
            positive: self.positive as f64 / total * 100.0,
            neutral: self.neutral as f64 / total * 100.0,
            negative: self.negative as f64 / total * 100.0,
        }
    }
}

/// Aggregate reviews into daily trend points, using the current time for
/// reviews without a date.
pub fn aggregate_trend(reviews: &[Value]) -> Vec<TrendPoint> {
    aggregate_trend_at(reviews, Utc::now())
}

/// Aggregate reviews into daily trend points. `now` stands in for reviews that
/// carry no date. Points are sorted ascending by day; the unknown-date bucket
/// always sorts last.
pub fn aggregate_trend_at(reviews: &[Value], now: DateTime<Utc>) -> Vec<TrendPoint> {
    if reviews.is_empty() {
        return Vec::new();
    }

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for review in reviews {
        let day = match review_date(review) {
            ReviewDate::Parsed(day) => Some(day),
            ReviewDate::Absent => Some(now.date_naive()),
            ReviewDate::Invalid => None,
        };
        let label = match day {
            Some(d) => d.format(LABEL_FORMAT).to_string(),
            None => UNKNOWN_DATE.to_string(),
        };

        let slot = *index.entry(label.clone()).or_insert_with(|| {
            buckets.push(Bucket {
                day,
                label,
                ..Default::default()
            });
            buckets.len() - 1
        });
        buckets[slot].record(review_sentiment(review));
    }

    // Stable sort: equal keys keep first-seen order
    buckets.sort_by_key(|b| (b.day.is_none(), b.day));

    tracing::debug!(
        "Aggregated {} reviews into {} trend points",
        reviews.len(),
        buckets.len()
    );

    buckets.iter().map(Bucket::to_point).collect()
}

fn review_date(review: &Value) -> ReviewDate {
    let Value::Object(map) = review else {
        return ReviewDate::Absent;
    };
    DATE_FIELDS
        .iter()
        .find_map(|f| map.get(*f).filter(|v| !is_blank(v)))
        .map(parse_review_date)
        .unwrap_or(ReviewDate::Absent)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a date value: RFC 3339 timestamps, `YYYY-MM-DD` with or without a
/// time part, `MM/DD/YYYY`, `YYYY/MM/DD`, or epoch milliseconds.
pub fn parse_review_date(value: &Value) -> ReviewDate {
    match value {
        Value::Null => ReviewDate::Absent,
        Value::String(s) => parse_date_str(s.trim())
            .map(ReviewDate::Parsed)
            .unwrap_or(ReviewDate::Invalid),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| ReviewDate::Parsed(dt.date_naive()))
            .unwrap_or(ReviewDate::Invalid),
        _ => ReviewDate::Invalid,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Flat `sentiment` label, nested `sentiment.label`, or a top-level `label`
fn review_sentiment(review: &Value) -> Sentiment {
    match review.get("sentiment") {
        Some(v) if !v.is_null() => sentiment_of(v),
        _ => review
            .get("label")
            .and_then(Value::as_str)
            .map(Sentiment::from_label)
            .unwrap_or_default(),
    }
}
