//! Natural-language insights and recommendations derived from aggregate
//! sentiment statistics. Both engines are pure: they never fail, and absent
//! input degrades to a fixed fallback list.

pub mod insights;
pub mod recommendations;
pub mod stats;

pub use insights::{generate_insights, FALLBACK_INSIGHTS};
pub use recommendations::{generate_recommendations, FALLBACK_RECOMMENDATIONS};
pub use stats::{SentimentSummary, MAX_STATEMENTS};
