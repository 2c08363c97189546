//! Print style rewrite
//!
//! Replaces screen presentation with absolute print styling before capture.
//! Every rule sets fixed values, so running the rewrite twice leaves the tree
//! unchanged.

use report_core::ReportNode;
use tracing::debug;

use crate::chart::CHART_WRAPPER_CLASS;
use crate::config::PrintTheme;
use crate::view::{CARD_CLASS, GRID_CLASS, METRICS_GRID_CLASS, VISUALIZATION_GRID_CLASS};

/// Class of chart containers mounted by third-party chart libraries
pub const EXTERNAL_CHART_WRAPPER_CLASS: &str = "recharts-wrapper";

/// Class carried by the headings the exporter injects
pub const SECTION_TITLE_CLASS: &str = "export-section-title";

pub const EXECUTIVE_SUMMARY: &str = "Executive Summary";
pub const ANALYSIS_RESULTS: &str = "Analysis Results";

const TEXT_TAGS: [&str; 16] = [
    "p", "span", "li", "td", "th", "label", "strong", "em", "small", "a", "h1", "h2", "h3", "h4",
    "h5", "h6",
];

/// Counts of what a rewrite touched
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StyleStats {
    pub text_elements: usize,
    pub headings: usize,
    pub chart_wrappers: usize,
    pub graphics: usize,
    pub cards: usize,
}

pub fn is_chart_wrapper(node: &ReportNode) -> bool {
    node.has_class(CHART_WRAPPER_CLASS) || node.has_class(EXTERNAL_CHART_WRAPPER_CLASS)
}

pub fn apply_print_styles(root: &mut ReportNode, theme: &PrintTheme) -> StyleStats {
    let mut stats = StyleStats::default();
    restyle(root, theme, &mut stats);
    stats
}

fn restyle(node: &mut ReportNode, theme: &PrintTheme, stats: &mut StyleStats) {
    if node.tag == "svg" {
        node.set_attr("width", "100%");
        node.set_attr("height", theme.chart_height.to_string());
        stats.graphics += 1;
        // Marks inside the graphic keep their own presentation
        return;
    }

    if TEXT_TAGS.contains(&node.tag.as_str()) {
        node.set_style("font-family", theme.font_family.as_str());
        node.set_style("color", theme.text_color.as_str());
        node.set_style("line-height", theme.line_height.as_str());
        stats.text_elements += 1;
    }

    if let Some(size) = top_level_heading_size(node) {
        node.set_style("font-size", size);
        node.set_style("font-weight", "600");
        node.set_style("margin", "24px 0 12px 0");
        node.set_style("padding-bottom", "6px");
        node.set_style("border-bottom", format!("2px solid {}", theme.primary_color));
        node.style.remove("background-clip");
        stats.headings += 1;
    }

    if is_chart_wrapper(node) {
        node.set_style("height", "auto");
        node.set_style("min-height", format!("{}px", theme.chart_height));
        node.set_style("width", "100%");
        node.set_style("margin", "0 auto");
        stats.chart_wrappers += 1;
    }

    if node.has_class(CARD_CLASS) {
        node.set_style("background", "#ffffff");
        node.set_style("border", "1px solid #e5e7eb");
        node.set_style("box-shadow", "none");
        node.set_style("page-break-inside", "avoid");
        stats.cards += 1;
    }

    for child in node.children.iter_mut() {
        restyle(child, theme, stats);
    }
}

fn top_level_heading_size(node: &ReportNode) -> Option<&'static str> {
    match node.heading_level()? {
        1 => Some("26px"),
        2 => Some("20px"),
        _ => None,
    }
}

fn section_title(text: &str) -> ReportNode {
    ReportNode::text("h2", text).with_class(SECTION_TITLE_CLASS)
}

/// Insert "Executive Summary" before the metrics grid and "Analysis Results"
/// before the visualization grid. Anchors are found by their grid class;
/// trees without those classes fall back to the first and second grids.
/// Anchors that are missing are skipped, as are anchors already preceded by
/// their title. Returns how many titles were inserted.
pub fn insert_section_titles(root: &mut ReportNode) -> usize {
    let (metrics, visualization) = grid_anchors(root);

    let mut inserted = 0;
    if insert_title(root, EXECUTIVE_SUMMARY, metrics.as_deref()) {
        inserted += 1;
    }
    // The first insertion may have shifted the second anchor
    let visualization = visualization.and_then(|_| grid_anchors(root).1);
    if insert_title(root, ANALYSIS_RESULTS, visualization.as_deref()) {
        inserted += 1;
    }
    inserted
}

/// Paths to the metrics and visualization grids. Grids nested in a grid are
/// not anchors.
fn grid_anchors(root: &ReportNode) -> (Option<Vec<usize>>, Option<Vec<usize>>) {
    let mut grids = Vec::new();
    collect_grid_paths(root, &mut Vec::new(), &mut grids);

    let by_class = |class: &str| {
        grids
            .iter()
            .find(|p| root.node_at(p).map_or(false, |n| n.has_class(class)))
            .cloned()
    };
    let metrics = by_class(METRICS_GRID_CLASS).or_else(|| grids.first().cloned());
    let visualization = by_class(VISUALIZATION_GRID_CLASS)
        .or_else(|| grids.iter().find(|p| Some(*p) != metrics.as_ref()).cloned());
    (metrics, visualization)
}

fn collect_grid_paths(node: &ReportNode, path: &mut Vec<usize>, grids: &mut Vec<Vec<usize>>) {
    if node.has_class(GRID_CLASS) && !path.is_empty() {
        grids.push(path.clone());
        return;
    }
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        collect_grid_paths(child, path, grids);
        path.pop();
    }
}

fn insert_title(root: &mut ReportNode, title: &str, anchor: Option<&[usize]>) -> bool {
    let Some(path) = anchor else {
        debug!("No anchor for section title '{}', skipping", title);
        return false;
    };

    if already_titled(root, path, title) {
        return false;
    }
    root.insert_before(path, section_title(title))
}

fn already_titled(root: &ReportNode, path: &[usize], title: &str) -> bool {
    let Some((&index, parent_path)) = path.split_last() else {
        return false;
    };
    index
        .checked_sub(1)
        .and_then(|prev| root.node_at(parent_path)?.children.get(prev))
        .map(|prev| prev.has_class(SECTION_TITLE_CLASS) && prev.text.as_deref() == Some(title))
        .unwrap_or(false)
}
