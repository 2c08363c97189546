mod channels;
mod templates;

pub use channels::{ConsoleChannel, LogChannel, MemoryChannel};
pub use templates::NoticeTemplate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Export lifecycle events surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    ExportStarted,
    ExportSucceeded { file_name: String },
    /// The report region to capture was not available
    TargetNotFound,
    /// Rasterization or saving failed; the cause is logged, not shown
    GenerationFailed,
}

impl NoticeKind {
    pub fn title(&self) -> &'static str {
        match self {
            NoticeKind::ExportStarted => "Generating PDF",
            NoticeKind::ExportSucceeded { .. } => "PDF Generated",
            NoticeKind::TargetNotFound | NoticeKind::GenerationFailed => "Export Failed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            NoticeKind::ExportStarted => "Please wait while your report is being prepared.",
            NoticeKind::ExportSucceeded { .. } => "Your report has been downloaded successfully.",
            NoticeKind::TargetNotFound => "Could not find the report content to export.",
            NoticeKind::GenerationFailed => "Failed to generate PDF. Please try again.",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, NoticeKind::TargetNotFound | NoticeKind::GenerationFailed)
    }
}

/// A transient user-visible message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            timestamp: chrono::Utc::now(),
            kind,
        }
    }

    pub fn export_started() -> Self {
        Self::new(NoticeKind::ExportStarted)
    }

    pub fn export_succeeded(file_name: impl Into<String>) -> Self {
        Self::new(NoticeKind::ExportSucceeded {
            file_name: file_name.into(),
        })
    }

    pub fn target_not_found() -> Self {
        Self::new(NoticeKind::TargetNotFound)
    }

    pub fn generation_failed() -> Self {
        Self::new(NoticeKind::GenerationFailed)
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Mirror notices into the tracing log
    pub log_notices: bool,
    /// Print notices to stderr for terminal users
    pub console: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            log_notices: true,
            console: false,
        }
    }
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let flag = |name: &str, default: bool| {
            std::env::var(name)
                .ok()
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(default)
        };

        Self {
            log_notices: flag("NOTIFY_LOG", true),
            console: flag("NOTIFY_CONSOLE", false),
        }
    }
}

/// Dispatches notices to all configured channels.
pub struct NotificationService {
    channels: std::sync::Arc<Vec<Box<dyn NotificationChannel>>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.log_notices {
            channels.push(Box::new(LogChannel));
        }
        if config.console {
            channels.push(Box::new(ConsoleChannel));
        }

        if channels.is_empty() {
            tracing::info!("No notification channels configured (set NOTIFY_LOG or NOTIFY_CONSOLE)");
        }

        Self::with_channels(channels)
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self {
            channels: std::sync::Arc::new(channels),
        }
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Send a notice to all channels, awaiting completion.
    pub async fn notify_async(&self, notice: &Notice) {
        dispatch(&self.channels, notice).await;
    }
}

async fn dispatch(channels: &[Box<dyn NotificationChannel>], notice: &Notice) {
    for channel in channels.iter() {
        match channel.send(notice).await {
            Ok(()) => tracing::debug!("Sent notice via {}", channel.name()),
            Err(e) => tracing::warn!("Failed to send notice via {}: {}", channel.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_texts_are_distinct() {
        let kinds = [
            NoticeKind::ExportStarted,
            NoticeKind::ExportSucceeded {
                file_name: "report.pdf".to_string(),
            },
            NoticeKind::TargetNotFound,
            NoticeKind::GenerationFailed,
        ];
        let descriptions: std::collections::HashSet<&str> =
            kinds.iter().map(|k| k.description()).collect();
        assert_eq!(descriptions.len(), 4);

        assert!(!kinds[0].is_failure());
        assert!(!kinds[1].is_failure());
        assert!(kinds[2].is_failure());
        assert!(kinds[3].is_failure());
    }

    #[test]
    fn test_notice_new_copies_texts() {
        let notice = Notice::generation_failed();
        assert_eq!(notice.title, "Export Failed");
        assert_eq!(notice.description, "Failed to generate PDF. Please try again.");
    }

    #[test]
    fn test_service_channels_from_config() {
        let service = NotificationService::new(&NotificationConfig {
            log_notices: true,
            console: true,
        });
        assert_eq!(service.channel_names(), vec!["log", "console"]);

        let service = NotificationService::new(&NotificationConfig {
            log_notices: false,
            console: false,
        });
        assert!(service.channel_names().is_empty());
    }

    #[tokio::test]
    async fn test_notify_async_reaches_memory_channel() {
        let memory = MemoryChannel::new();
        let service = NotificationService::with_channels(vec![Box::new(memory.clone())]);

        service.notify_async(&Notice::export_started()).await;
        service.notify_async(&Notice::export_succeeded("out.pdf")).await;

        let kinds = memory.kinds();
        assert_eq!(
            kinds,
            vec![
                NoticeKind::ExportStarted,
                NoticeKind::ExportSucceeded {
                    file_name: "out.pdf".to_string()
                }
            ]
        );
    }
}
