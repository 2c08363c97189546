//! Record normalization and trend aggregation for sentiment reports.
//!
//! Everything here is a pure function of its input: raw JSON records go in,
//! fixed-shape structures come out, and missing fields are filled with
//! defaults instead of raising errors.

pub mod normalizer;
pub mod trend;

pub use normalizer::{
    normalize_aspects, normalize_aspects_with_rng, normalize_key_phrases, sentiment_of,
};
pub use trend::{aggregate_trend, aggregate_trend_at, parse_review_date, ReviewDate, UNKNOWN_DATE};
