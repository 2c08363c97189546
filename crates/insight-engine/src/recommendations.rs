//! Recommendation Engine
//!
//! Turns the same statistics the insights use into next steps. Selection is
//! threshold based: only clearly negative aspects become focus areas and only
//! clearly positive ones are suggested as strengths.

use report_core::{display_number, AnalysisData, Sentiment};

use crate::stats::{complete_analysis, ranked_above, SentimentSummary, MAX_STATEMENTS};

/// Returned verbatim when there is no analysis or it lacks `fileAnalysis`
pub const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Run a sentiment analysis to receive tailored recommendations.",
    "Collect more customer feedback to improve analysis accuracy.",
    "Review aspect-level results once the analysis completes.",
];

/// Aspects above this negative share become improvement priorities
const FOCUS_NEGATIVE_THRESHOLD: f64 = 30.0;
/// Aspects above this positive share are worth promoting
const STRENGTH_POSITIVE_THRESHOLD: f64 = 60.0;

fn sentiment_actions(sentiment: Sentiment) -> [&'static str; 2] {
    match sentiment {
        Sentiment::Positive => [
            "Maintain the practices behind positive customer experiences and document what works.",
            "Encourage satisfied customers to share public reviews and referrals.",
        ],
        Sentiment::Negative => [
            "Prioritize resolving the most frequent customer complaints.",
            "Reach out to dissatisfied customers directly to understand and address their concerns.",
        ],
        Sentiment::Neutral => [
            "Look for opportunities to turn neutral experiences into memorable positive ones.",
            "Gather more detailed feedback to learn what would delight customers.",
        ],
    }
}

const NO_ASPECTS_RECOMMENDATION: &str =
    "Set up a structured feedback system to capture aspect-level customer opinions.";

const CLOSING_RECOMMENDATIONS: [&str; 2] = [
    "Track sentiment trends over time to measure the impact of changes.",
    "Share these findings with product and support teams to align improvement efforts.",
];

/// Up to five recommendations, most important first.
pub fn generate_recommendations(data: Option<&AnalysisData>) -> Vec<String> {
    let Some((analysis, file)) = complete_analysis(data) else {
        tracing::debug!("No file analysis available, using fallback recommendations");
        return FALLBACK_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect();
    };

    let summary = SentimentSummary::from_analysis(analysis);
    let mut recs: Vec<String> = sentiment_actions(summary.sentiment)
        .iter()
        .map(|s| s.to_string())
        .collect();

    if file.aspects.is_empty() {
        recs.push(NO_ASPECTS_RECOMMENDATION.to_string());
    } else {
        // Unnamed aspects keep their rank and are reported as "Unknown"
        let weak = ranked_above(&file.aspects, |a| a.negative, FOCUS_NEGATIVE_THRESHOLD);
        let mut weak = weak.iter().map(|(a, v)| (a.label(), *v));

        if let Some((name, negative)) = weak.next() {
            recs.push(format!(
                "Focus on improving {}, which has {}% negative sentiment.",
                name,
                display_number(negative)
            ));
        }
        if let Some((name, negative)) = weak.next() {
            recs.push(format!(
                "Address {} as a secondary priority ({}% negative sentiment).",
                name,
                display_number(negative)
            ));
        }

        let strong = ranked_above(&file.aspects, |a| a.positive, STRENGTH_POSITIVE_THRESHOLD);
        if let Some((name, positive)) = strong.first().map(|(a, v)| (a.label(), *v)) {
            recs.push(format!(
                "Leverage {} as a strength in marketing and communications ({}% positive sentiment).",
                name,
                display_number(positive)
            ));
        }
    }

    recs.extend(CLOSING_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    recs.truncate(MAX_STATEMENTS);
    recs
}
