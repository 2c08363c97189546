use report_core::{AnalysisData, AspectSummary, FileAnalysis, Sentiment};

/// Upper bound on statements returned by either engine
pub const MAX_STATEMENTS: usize = 5;

const DEFAULT_SCORE: f64 = 50.0;

/// Overall sentiment category and score with defaults applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentSummary {
    pub sentiment: Sentiment,
    pub score: f64,
}

impl SentimentSummary {
    pub fn from_analysis(data: &AnalysisData) -> Self {
        let overall = data.overall_sentiment.as_ref();
        Self {
            sentiment: overall
                .and_then(|o| o.sentiment.as_deref())
                .map(Sentiment::from_label)
                .unwrap_or_default(),
            score: overall.and_then(|o| o.score).unwrap_or(DEFAULT_SCORE),
        }
    }
}

/// Both engines only run on data that carries `fileAnalysis`
pub(crate) fn complete_analysis(data: Option<&AnalysisData>) -> Option<(&AnalysisData, &FileAnalysis)> {
    data.and_then(|d| d.file_analysis.as_ref().map(|f| (d, f)))
}

/// Aspect with the highest value for `metric`. Missing values count as 0 and
/// the earliest aspect wins ties.
pub(crate) fn strongest_aspect<'a>(
    aspects: &'a [AspectSummary],
    metric: impl Fn(&AspectSummary) -> Option<f64>,
) -> Option<&'a AspectSummary> {
    let mut best: Option<(&'a AspectSummary, f64)> = None;
    for aspect in aspects {
        let value = metric(aspect).unwrap_or(0.0);
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((aspect, value)),
        }
    }
    best.map(|(a, _)| a)
}

/// Aspects whose `metric` exceeds `threshold`, highest first. Equal values keep
/// input order.
pub(crate) fn ranked_above<'a>(
    aspects: &'a [AspectSummary],
    metric: impl Fn(&AspectSummary) -> Option<f64>,
    threshold: f64,
) -> Vec<(&'a AspectSummary, f64)> {
    let mut ranked: Vec<(&'a AspectSummary, f64)> = aspects
        .iter()
        .filter_map(|a| metric(a).filter(|v| *v > threshold).map(|v| (a, v)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Accuracy scores arrive either as a fraction or as a percentage
pub(crate) fn as_percentage(value: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value * 100.0
    } else {
        value
    }
}
