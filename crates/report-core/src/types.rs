use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ReportError;

/// Sentiment bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Parse a free-form label. Anything that is not clearly positive or
    /// negative lands in the neutral bucket.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Human-readable label
    pub fn to_label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Chart color for this bucket
    pub fn color(&self) -> &'static str {
        match self {
            Sentiment::Positive => "#22c55e",
            Sentiment::Neutral => "#94a3b8",
            Sentiment::Negative => "#ef4444",
        }
    }
}

/// Key phrase after normalization. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedKeyPhrase {
    pub text: String,
    pub value: f64,
    pub sentiment: Sentiment,
}

/// Aspect after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAspect {
    pub aspect: String,
    pub sentiment: Sentiment,
    /// Integer percentage, synthesized when the input had none
    pub confidence: u8,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative: Option<f64>,
}

/// Sentiment distribution for one calendar-day bucket (percentages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl TrendPoint {
    pub fn value(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }
}

/// Aggregate analysis produced upstream. Read-only to the report pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    #[serde(default)]
    pub overall_sentiment: Option<OverallSentiment>,
    #[serde(default)]
    pub file_analysis: Option<FileAnalysis>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallSentiment {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub aspects: Vec<AspectSummary>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub accuracy_score: Option<f64>,
}

/// Display name given to aspects that arrive without one
pub const UNKNOWN_ASPECT: &str = "Unknown";

/// Aspect statistics as they arrive in `fileAnalysis.aspects`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AspectSummary {
    #[serde(default)]
    pub aspect: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub positive: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub neutral: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub negative: Option<f64>,
}

impl AspectSummary {
    pub fn named(aspect: &str) -> Self {
        Self {
            aspect: Some(aspect.to_string()),
            ..Default::default()
        }
    }

    /// Display name, or [`UNKNOWN_ASPECT`] when the aspect is unnamed
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or(UNKNOWN_ASPECT)
    }

    /// `aspect`, falling back to `name`. Blank names count as missing.
    pub fn display_name(&self) -> Option<&str> {
        self.aspect
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// Numbers, numeric strings or null. Anything else reads as missing.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Upstream sends `null` for empty arrays.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

/// One x-axis entry of a chart: a category label and a value per series key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDatum {
    pub label: String,
    pub values: BTreeMap<String, f64>,
}

/// Input to the chart-rendering capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub title: String,
    pub kind: ChartKind,
    pub series_keys: Vec<String>,
    pub series_data: Vec<SeriesDatum>,
}

impl ChartSeries {
    /// Largest value across all keys, used for axis scaling
    pub fn max_value(&self) -> f64 {
        self.series_data
            .iter()
            .flat_map(|d| d.values.values().copied())
            .fold(0.0, f64::max)
    }
}

/// Metadata handed to the rasterizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    pub date: String,
}

/// Paged document returned by a rasterizer
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl RenderedDocument {
    pub async fn save(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &self.bytes).await?;
        Ok(())
    }
}

/// Format a score or percentage the way report text shows it: whole numbers
/// without decimals, everything else with one decimal place.
pub fn display_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
