//! Built-in chart renderer emitting SVG element trees.

use report_core::{ChartKind, ChartRenderer, ChartSeries, ReportNode, Sentiment};

/// Class marking the container a chart is mounted in
pub const CHART_WRAPPER_CLASS: &str = "chart-wrapper";

const VIEW_WIDTH: f64 = 600.0;
const VIEW_HEIGHT: f64 = 300.0;
const PADDING: f64 = 20.0;

const PALETTE: [&str; 4] = ["#3b82f6", "#a855f7", "#f59e0b", "#14b8a6"];

/// Renders line and bar charts as `svg` subtrees. Drawing is synchronous, so
/// the renderer is always ready. The `svg` is sized only through inline CSS,
/// the way a responsive chart library mounts it on screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgChartRenderer;

impl SvgChartRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, series: &ChartSeries) -> ReportNode {
        let max = series.max_value().max(1.0);
        let marks = match series.kind {
            ChartKind::Bar => bar_marks(series, max),
            ChartKind::Line => line_marks(series, max),
        };

        let svg = ReportNode::new("svg")
            .with_attr("viewBox", format!("0 0 {} {}", VIEW_WIDTH, VIEW_HEIGHT))
            .with_attr("aria-label", series.title.clone())
            .with_attr("role", "img")
            .with_style("width", "100%")
            .with_style("height", "100%")
            .with_children(marks);

        ReportNode::new("div")
            .with_class(CHART_WRAPPER_CLASS)
            .with_style("position", "relative")
            .with_style("width", "100%")
            .with_style("height", "100%")
            .with_child(svg)
    }
}

fn key_color(key: &str, index: usize) -> String {
    match key.to_lowercase().as_str() {
        "positive" | "neutral" | "negative" => Sentiment::from_label(key).color().to_string(),
        _ => PALETTE[index % PALETTE.len()].to_string(),
    }
}

fn plot_width() -> f64 {
    VIEW_WIDTH - 2.0 * PADDING
}

fn plot_height() -> f64 {
    VIEW_HEIGHT - 2.0 * PADDING
}

fn y_for(value: f64, max: f64) -> f64 {
    VIEW_HEIGHT - PADDING - (value / max) * plot_height()
}

fn bar_marks(series: &ChartSeries, max: f64) -> Vec<ReportNode> {
    let groups = series.series_data.len().max(1) as f64;
    let keys = series.series_keys.len().max(1) as f64;
    let group_width = plot_width() / groups;
    let bar_width = group_width * 0.8 / keys;

    let mut marks = Vec::new();
    for (g, datum) in series.series_data.iter().enumerate() {
        for (k, key) in series.series_keys.iter().enumerate() {
            let value = datum.values.get(key).copied().unwrap_or(0.0).max(0.0);
            let y = y_for(value, max);
            let x = PADDING + g as f64 * group_width + group_width * 0.1 + k as f64 * bar_width;
            marks.push(
                ReportNode::new("rect")
                    .with_attr("x", format!("{:.1}", x))
                    .with_attr("y", format!("{:.1}", y))
                    .with_attr("width", format!("{:.1}", bar_width))
                    .with_attr("height", format!("{:.1}", VIEW_HEIGHT - PADDING - y))
                    .with_attr("fill", key_color(key, k))
                    .with_attr("data-label", datum.label.clone()),
            );
        }
    }
    marks
}

fn line_marks(series: &ChartSeries, max: f64) -> Vec<ReportNode> {
    let steps = series.series_data.len().saturating_sub(1).max(1) as f64;

    series
        .series_keys
        .iter()
        .enumerate()
        .map(|(k, key)| {
            let points: Vec<String> = series
                .series_data
                .iter()
                .enumerate()
                .map(|(i, datum)| {
                    let value = datum.values.get(key).copied().unwrap_or(0.0);
                    let x = PADDING + i as f64 / steps * plot_width();
                    format!("{:.1},{:.1}", x, y_for(value, max))
                })
                .collect();

            ReportNode::new("polyline")
                .with_attr("points", points.join(" "))
                .with_attr("fill", "none")
                .with_attr("stroke", key_color(key, k))
                .with_attr("stroke-width", "2")
                .with_attr("data-key", key.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::SeriesDatum;
    use std::collections::BTreeMap;

    fn series(kind: ChartKind) -> ChartSeries {
        let datum = |label: &str, pos: f64, neg: f64| SeriesDatum {
            label: label.to_string(),
            values: BTreeMap::from([("positive".to_string(), pos), ("negative".to_string(), neg)]),
        };
        ChartSeries {
            title: "Trend".to_string(),
            kind,
            series_keys: vec!["positive".to_string(), "negative".to_string()],
            series_data: vec![datum("Mar 1, 2024", 80.0, 20.0), datum("Mar 2, 2024", 50.0, 50.0)],
        }
    }

    #[test]
    fn test_wrapper_and_css_only_svg() {
        let node = SvgChartRenderer::new().render(&series(ChartKind::Line));
        assert!(node.has_class(CHART_WRAPPER_CLASS));

        let svg = &node.children[0];
        assert_eq!(svg.tag, "svg");
        assert_eq!(svg.attr("aria-label"), Some("Trend"));
        assert!(svg.attr("width").is_none());
        assert!(svg.attr("height").is_none());
        assert_eq!(svg.style_value("width"), Some("100%"));
    }

    #[test]
    fn test_line_chart_has_polyline_per_key() {
        let node = SvgChartRenderer::new().render(&series(ChartKind::Line));
        let svg = &node.children[0];
        assert_eq!(svg.children.len(), 2);
        assert_eq!(svg.children[0].attr("stroke"), Some("#22c55e"));
        assert_eq!(svg.children[1].attr("stroke"), Some("#ef4444"));
        assert_eq!(svg.children[0].attr("points").unwrap().split(' ').count(), 2);
    }

    #[test]
    fn test_bar_chart_scales_to_max() {
        let node = SvgChartRenderer::new().render(&series(ChartKind::Bar));
        let rects: Vec<&ReportNode> = node.children[0].children.iter().collect();
        assert_eq!(rects.len(), 4);

        // The 80% bar is the tallest and spans the whole plot height
        let heights: Vec<f64> = rects
            .iter()
            .map(|r| r.attr("height").unwrap().parse().unwrap())
            .collect();
        assert!((heights[0] - plot_height()).abs() < 0.1);
        assert!(heights[1] < heights[0]);
    }

    #[test]
    fn test_always_ready() {
        assert!(SvgChartRenderer::new().is_ready());
    }
}
