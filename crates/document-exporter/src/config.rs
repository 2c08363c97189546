use report_core::ReportError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Fixed name of the saved report
pub const DEFAULT_FILE_NAME: &str = "sentiment_analysis_report.pdf";

/// Print presentation applied during the style rewrite. Passed in explicitly
/// so the exporter never reads ambient theme state.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintTheme {
    pub font_family: String,
    pub text_color: String,
    /// Accent used for heading rules
    pub primary_color: String,
    pub line_height: String,
    /// Rasterized height of every chart, in pixels
    pub chart_height: u32,
}

impl Default for PrintTheme {
    fn default() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            text_color: "#1f2937".to_string(),
            primary_color: "#3b82f6".to_string(),
            line_height: "1.5".to_string(),
            chart_height: 300,
        }
    }
}

/// How the exporter waits for charts before capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Sleep for a fixed duration
    Fixed(Duration),
    /// Poll the renderer's readiness marker every `interval`, capturing anyway
    /// once `timeout` has elapsed
    Poll { interval: Duration, timeout: Duration },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::Poll {
            interval: Duration::from_millis(100),
            timeout: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub settle: SettleStrategy,
    pub theme: PrintTheme,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: DEFAULT_FILE_NAME.to_string(),
            settle: SettleStrategy::default(),
            theme: PrintTheme::default(),
        }
    }
}

impl ExportConfig {
    /// Load from environment variables, falling back to defaults for anything
    /// unset. Malformed numbers are rejected.
    pub fn from_env() -> Result<Self, ReportError> {
        let defaults = Self::default();
        let theme_defaults = defaults.theme.clone();

        let settle_ms: u64 = env_parse("REPORT_SETTLE_DELAY_MS", 1500)?;
        let poll_ms: u64 = env_parse("REPORT_POLL_INTERVAL_MS", 100)?;
        let settle = match env::var("REPORT_SETTLE_MODE")
            .unwrap_or_else(|_| "poll".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "fixed" => SettleStrategy::Fixed(Duration::from_millis(settle_ms)),
            "poll" => SettleStrategy::Poll {
                interval: Duration::from_millis(poll_ms.max(1)),
                timeout: Duration::from_millis(settle_ms),
            },
            other => {
                return Err(ReportError::Config(format!(
                    "REPORT_SETTLE_MODE must be 'fixed' or 'poll', got '{}'",
                    other
                )))
            }
        };

        let config = Self {
            output_dir: env::var("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            file_name: env::var("REPORT_FILENAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.file_name),
            settle,
            theme: PrintTheme {
                font_family: env::var("REPORT_FONT_FAMILY").unwrap_or(theme_defaults.font_family),
                text_color: env::var("REPORT_TEXT_COLOR").unwrap_or(theme_defaults.text_color),
                primary_color: env::var("REPORT_PRIMARY_COLOR")
                    .unwrap_or(theme_defaults.primary_color),
                line_height: theme_defaults.line_height,
                chart_height: env_parse("REPORT_CHART_HEIGHT", theme_defaults.chart_height)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.file_name.contains('/') || self.file_name.contains('\\') {
            return Err(ReportError::Config(format!(
                "REPORT_FILENAME must be a bare file name, got '{}'",
                self.file_name
            )));
        }
        if self.theme.chart_height == 0 {
            return Err(ReportError::Config(
                "REPORT_CHART_HEIGHT must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ReportError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| ReportError::Config(format!("{} is invalid ({}): {}", name, raw, e))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.output_path(), PathBuf::from("./sentiment_analysis_report.pdf"));
        assert!(matches!(config.settle, SettleStrategy::Poll { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_paths_and_zero_height() {
        let mut config = ExportConfig {
            file_name: "../escape.pdf".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReportError::Config(_))));

        config.file_name = DEFAULT_FILE_NAME.to_string();
        config.theme.chart_height = 0;
        assert!(matches!(config.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_env_parse_reports_variable() {
        std::env::set_var("REPORT_TEST_BAD_NUMBER", "soon");
        let err = env_parse::<u64>("REPORT_TEST_BAD_NUMBER", 5).unwrap_err();
        assert!(err.to_string().contains("REPORT_TEST_BAD_NUMBER"));
        std::env::remove_var("REPORT_TEST_BAD_NUMBER");

        assert_eq!(env_parse::<u64>("REPORT_TEST_UNSET_NUMBER", 5).unwrap(), 5);
    }
}
