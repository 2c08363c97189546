use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::templates::NoticeTemplate;
use crate::{Notice, NoticeKind, NotificationChannel, NotificationError};

/// Writes notices to the tracing log.
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, notice: &Notice) -> Result<(), NotificationError> {
        if notice.kind.is_failure() {
            tracing::warn!(title = %notice.title, "{}", notice.description);
        } else {
            tracing::info!(title = %notice.title, "{}", notice.description);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Prints notices to stderr, one line each.
pub struct ConsoleChannel;

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    async fn send(&self, notice: &Notice) -> Result<(), NotificationError> {
        eprintln!("{}", NoticeTemplate::render_text(notice));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Keeps every notice in memory. Clones share the same buffer, so a UI (or a
/// test) can hold one handle while the service owns another.
#[derive(Clone, Default)]
pub struct MemoryChannel {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices().into_iter().map(|n| n.kind).collect()
    }
}

#[async_trait]
impl NotificationChannel for MemoryChannel {
    async fn send(&self, notice: &Notice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .map_err(|e| NotificationError::Channel(format!("notice buffer poisoned: {}", e)))?
            .push(notice.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
