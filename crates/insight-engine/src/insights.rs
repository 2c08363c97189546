//! Insight Engine
//!
//! Describes what the aggregate numbers say: overall framing first, then the
//! standout aspects, then how much the analysis can be trusted.

use report_core::{display_number, AnalysisData, Sentiment};

use crate::stats::{as_percentage, complete_analysis, strongest_aspect, SentimentSummary, MAX_STATEMENTS};

/// Returned verbatim when there is no analysis or it lacks `fileAnalysis`
pub const FALLBACK_INSIGHTS: [&str; 3] = [
    "Not enough analysis data is available to generate insights yet.",
    "Upload a file or run an analysis to see sentiment patterns.",
    "Insights will appear here once aspect-level results are available.",
];

/// Aspect counts above this get a summary sentence
const ASPECT_SUMMARY_MIN: usize = 3;

fn sentiment_implication(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => {
            "Customers are broadly satisfied, which points to a strong product-market fit."
        }
        Sentiment::Negative => {
            "Customer dissatisfaction is significant and signals issues that need prompt attention."
        }
        Sentiment::Neutral => {
            "Customer opinion is mixed, with no strong lean toward satisfaction or dissatisfaction."
        }
    }
}

/// Up to five insight statements, most important first.
pub fn generate_insights(data: Option<&AnalysisData>) -> Vec<String> {
    let Some((analysis, file)) = complete_analysis(data) else {
        tracing::debug!("No file analysis available, using fallback insights");
        return FALLBACK_INSIGHTS.iter().map(|s| s.to_string()).collect();
    };

    let summary = SentimentSummary::from_analysis(analysis);
    let mut insights = vec![
        format!(
            "Overall customer sentiment is {} with a score of {}/100.",
            summary.sentiment.as_str(),
            display_number(summary.score)
        ),
        sentiment_implication(summary.sentiment).to_string(),
    ];

    if !file.aspects.is_empty() {
        if let Some(name) = strongest_aspect(&file.aspects, |a| a.positive).and_then(|a| a.display_name()) {
            insights.push(format!("{} is the most positively perceived aspect.", name));
        }

        if let Some(name) = strongest_aspect(&file.aspects, |a| a.negative).and_then(|a| a.display_name()) {
            insights.push(format!("{} is the most negatively perceived aspect.", name));
        }

        if file.aspects.len() > ASPECT_SUMMARY_MIN {
            insights.push(format!(
                "{} distinct aspects were identified across the analyzed feedback.",
                file.aspects.len()
            ));
        }
    }

    if let Some(accuracy) = file.accuracy_score {
        insights.push(format!(
            "The analysis was performed with {}% model accuracy.",
            display_number(as_percentage(accuracy))
        ));
    }

    insights.truncate(MAX_STATEMENTS);
    insights
}
