use anyhow::{Context, Result};
use report_core::AnalysisData;
use serde_json::Value;
use std::path::Path;

/// An analysis file: the typed view the engines read, plus the raw aspect
/// records for normalization.
pub struct AnalysisInput {
    pub data: AnalysisData,
    pub raw_aspects: Vec<Value>,
}

pub fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Records from a file holding either a bare array or an object wrapping one
/// under `key`.
pub fn read_records(path: &Path, key: &str) -> Result<Vec<Value>> {
    match read_json(path)? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("{} has no '{}' array", path.display(), key),
        },
        _ => anyhow::bail!("{} must contain a JSON array", path.display()),
    }
}

pub fn read_analysis(path: &Path) -> Result<AnalysisInput> {
    let value = read_json(path)?;
    let raw_aspects = value
        .pointer("/fileAnalysis/aspects")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let data = serde_json::from_value(value)
        .with_context(|| format!("{} is not an analysis result", path.display()))?;
    Ok(AnalysisInput { data, raw_aspects })
}
