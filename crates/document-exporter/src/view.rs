//! Report view builder
//!
//! Lays the analysis out as the on-screen report tree: header, metric cards,
//! a visualization grid and the insight/recommendation lists. Styling here is
//! the screen styling (dark cards, CSS-sized charts); the exporter replaces it
//! with print styling before capture.

use report_core::{
    display_number, AnalysisData, ChartKind, ChartRenderer, ChartSeries, NormalizedAspect,
    NormalizedKeyPhrase, ReportNode, SeriesDatum, Sentiment, TrendPoint,
};
use std::collections::BTreeMap;

pub const REPORT_ROOT_CLASS: &str = "report-content";
pub const GRID_CLASS: &str = "grid";
pub const CARD_CLASS: &str = "card";
pub const METRICS_GRID_CLASS: &str = "metrics-grid";
pub const VISUALIZATION_GRID_CLASS: &str = "visualization-grid";

const MAX_KEY_PHRASES: usize = 15;

/// Everything the report view shows, already normalized
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportInputs<'a> {
    pub analysis: Option<&'a AnalysisData>,
    pub trend: &'a [TrendPoint],
    pub key_phrases: &'a [NormalizedKeyPhrase],
    pub aspects: &'a [NormalizedAspect],
    pub insights: &'a [String],
    pub recommendations: &'a [String],
}

pub fn build_report_view(inputs: &ReportInputs<'_>, renderer: &dyn ChartRenderer) -> ReportNode {
    ReportNode::new("div")
        .with_class(REPORT_ROOT_CLASS)
        .with_attr("id", "report-content")
        .with_style("background", "#0f172a")
        .with_style("color", "#e2e8f0")
        .with_style("font-family", "Inter, system-ui, sans-serif")
        .with_child(header())
        .with_child(metrics_grid(inputs))
        .with_child(visualization_grid(inputs, renderer))
        .with_child(statement_card("insights", "Key Insights", inputs.insights))
        .with_child(statement_card("recommendations", "Recommendations", inputs.recommendations))
}

fn header() -> ReportNode {
    ReportNode::new("div")
        .with_class("report-header")
        .with_child(
            ReportNode::text("h1", "Sentiment Analysis Report")
                .with_style("font-size", "2.25rem")
                .with_style("background-clip", "text"),
        )
        .with_child(
            ReportNode::text("p", "Customer feedback analysis and recommendations")
                .with_class("subtitle")
                .with_style("color", "#94a3b8"),
        )
}

fn card(class: &str) -> ReportNode {
    ReportNode::new("div")
        .with_class(CARD_CLASS)
        .with_class(class)
        .with_style("background", "rgba(30, 41, 59, 0.8)")
        .with_style("border-radius", "12px")
        .with_style("box-shadow", "0 10px 15px -3px rgba(0, 0, 0, 0.4)")
        .with_style("padding", "1.5rem")
}

fn grid(class: &str) -> ReportNode {
    ReportNode::new("div")
        .with_class(GRID_CLASS)
        .with_class(class)
        .with_style("display", "grid")
        .with_style("gap", "1.5rem")
}

fn metric_card(label: &str, value: String) -> ReportNode {
    card("metric-card")
        .with_child(ReportNode::text("p", label).with_class("metric-label"))
        .with_child(
            ReportNode::text("p", value)
                .with_class("metric-value")
                .with_style("font-size", "1.875rem")
                .with_style("font-weight", "700"),
        )
}

fn metrics_grid(inputs: &ReportInputs<'_>) -> ReportNode {
    let overall = inputs.analysis.and_then(|a| a.overall_sentiment.as_ref());
    let file = inputs.analysis.and_then(|a| a.file_analysis.as_ref());

    let sentiment = overall
        .and_then(|o| o.sentiment.as_deref())
        .map(Sentiment::from_label)
        .unwrap_or_default();
    let score = overall
        .and_then(|o| o.score)
        .map(|s| format!("{}/100", display_number(s)))
        .unwrap_or_else(|| "N/A".to_string());
    let accuracy = file
        .and_then(|f| f.accuracy_score)
        .map(|a| {
            let pct = if (0.0..=1.0).contains(&a) { a * 100.0 } else { a };
            format!("{}%", display_number(pct))
        })
        .unwrap_or_else(|| "N/A".to_string());
    let aspect_count = file
        .map(|f| f.aspects.len())
        .filter(|n| *n > 0)
        .unwrap_or(inputs.aspects.len());

    grid(METRICS_GRID_CLASS)
        .with_style("grid-template-columns", "repeat(4, minmax(0, 1fr))")
        .with_child(metric_card("Overall Sentiment", sentiment.to_label().to_string()))
        .with_child(metric_card("Sentiment Score", score))
        .with_child(metric_card("Model Accuracy", accuracy))
        .with_child(metric_card("Aspects Analyzed", aspect_count.to_string()))
}

fn visualization_grid(inputs: &ReportInputs<'_>, renderer: &dyn ChartRenderer) -> ReportNode {
    let sentiment_keys: Vec<String> = Sentiment::ALL.iter().map(|s| s.as_str().to_string()).collect();

    let trend_body = if inputs.trend.is_empty() {
        ReportNode::text("p", "No trend data available.").with_class("empty-state")
    } else {
        renderer.render(&ChartSeries {
            title: "Sentiment Trend".to_string(),
            kind: ChartKind::Line,
            series_keys: sentiment_keys.clone(),
            series_data: inputs
                .trend
                .iter()
                .map(|p| SeriesDatum {
                    label: p.date.clone(),
                    values: Sentiment::ALL
                        .iter()
                        .map(|s| (s.as_str().to_string(), p.value(*s)))
                        .collect(),
                })
                .collect(),
        })
    };

    let aspect_body = if inputs.aspects.is_empty() {
        ReportNode::text("p", "No aspect data available.").with_class("empty-state")
    } else {
        renderer.render(&ChartSeries {
            title: "Aspect Sentiment".to_string(),
            kind: ChartKind::Bar,
            series_keys: sentiment_keys,
            series_data: inputs.aspects.iter().map(aspect_datum).collect(),
        })
    };

    grid(VISUALIZATION_GRID_CLASS)
        .with_style("grid-template-columns", "repeat(2, minmax(0, 1fr))")
        .with_child(
            card("chart-card")
                .with_child(ReportNode::text("h3", "Sentiment Trend"))
                .with_child(trend_body),
        )
        .with_child(
            card("chart-card")
                .with_child(ReportNode::text("h3", "Aspect Sentiment"))
                .with_child(aspect_body),
        )
        .with_child(key_phrase_card(inputs.key_phrases))
}

fn aspect_datum(aspect: &NormalizedAspect) -> SeriesDatum {
    let values: BTreeMap<String, f64> = [
        (Sentiment::Positive, aspect.positive),
        (Sentiment::Neutral, aspect.neutral),
        (Sentiment::Negative, aspect.negative),
    ]
    .into_iter()
    .map(|(s, v)| (s.as_str().to_string(), v.unwrap_or(0.0)))
    .collect();

    SeriesDatum {
        label: aspect.aspect.clone(),
        values,
    }
}

fn key_phrase_card(phrases: &[NormalizedKeyPhrase]) -> ReportNode {
    let body = if phrases.is_empty() {
        ReportNode::text("p", "No key phrases extracted.").with_class("empty-state")
    } else {
        ReportNode::new("ul").with_class("key-phrases").with_children(
            phrases.iter().take(MAX_KEY_PHRASES).map(|p| {
                ReportNode::text("li", format!("{} ({})", p.text, display_number(p.value)))
                    .with_style("color", p.sentiment.color())
            }),
        )
    };

    card("key-phrase-card")
        .with_child(ReportNode::text("h3", "Key Phrases"))
        .with_child(body)
}

fn statement_card(class: &str, title: &str, statements: &[String]) -> ReportNode {
    card(class)
        .with_child(ReportNode::text("h2", title))
        .with_child(
            ReportNode::new("ul")
                .with_children(statements.iter().map(|s| ReportNode::text("li", s.clone()))),
        )
}
