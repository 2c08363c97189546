use chrono::Utc;
use notification_service::{Notice, NotificationService};
use report_core::{ChartRenderer, DocumentMeta, DocumentRasterizer, ReportError, ReportNode};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{ExportConfig, SettleStrategy};
use crate::print_style::{apply_print_styles, insert_section_titles};

pub const DEFAULT_TITLE: &str = "Sentiment Analysis Report";

/// Lifecycle of a single export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Preparing,
    Waiting,
    StyleRewrite,
    Rasterizing,
    Saved,
    Failed,
}

/// Per-export options handed to the rasterizer
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub title: String,
    pub date: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            date: Utc::now().format("%B %-d, %Y").to_string(),
        }
    }
}

impl ExportOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            title: self.title.clone(),
            date: self.date.clone(),
        }
    }
}

/// Clears the busy flag when dropped, so every exit path releases it.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turns a rendered report tree into a saved PDF.
///
/// One export runs at a time; a trigger arriving while an export is in flight
/// is rejected with [`ReportError::Busy`]. Every outcome is reported to the
/// user through the notification service.
pub struct DocumentExporter {
    rasterizer: Arc<dyn DocumentRasterizer>,
    notifier: Arc<NotificationService>,
    readiness: Option<Arc<dyn ChartRenderer>>,
    config: ExportConfig,
    busy: AtomicBool,
    phase: Mutex<ExportPhase>,
}

impl DocumentExporter {
    pub fn new(
        rasterizer: Arc<dyn DocumentRasterizer>,
        notifier: Arc<NotificationService>,
        config: ExportConfig,
    ) -> Self {
        Self {
            rasterizer,
            notifier,
            readiness: None,
            config,
            busy: AtomicBool::new(false),
            phase: Mutex::new(ExportPhase::Idle),
        }
    }

    /// Poll this renderer's readiness marker while settling
    pub fn with_readiness(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.readiness = Some(renderer);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Callers consult this to disable the export trigger
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase.lock().map(|p| *p).unwrap_or(ExportPhase::Idle)
    }

    fn enter(&self, phase: ExportPhase) {
        debug!(?phase, "Export phase");
        if let Ok(mut current) = self.phase.lock() {
            *current = phase;
        }
    }

    /// Export the report region. The tree is restyled in place for print.
    pub async fn export(
        &self,
        target: Option<&mut ReportNode>,
        options: &ExportOptions,
    ) -> Result<PathBuf, ReportError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            warn!("Export requested while another export is running");
            return Err(ReportError::Busy);
        };

        self.enter(ExportPhase::Preparing);
        let Some(root) = target else {
            warn!("Export target not found");
            self.enter(ExportPhase::Failed);
            self.notifier.notify_async(&Notice::target_not_found()).await;
            return Err(ReportError::TargetNotFound);
        };

        info!(title = %options.title, "Starting report export");
        self.notifier.notify_async(&Notice::export_started()).await;

        match self.run(root, options).await {
            Ok(path) => {
                self.enter(ExportPhase::Saved);
                info!(path = %path.display(), "Report exported");
                self.notifier
                    .notify_async(&Notice::export_succeeded(self.config.file_name.clone()))
                    .await;
                Ok(path)
            }
            Err(e) => {
                self.enter(ExportPhase::Failed);
                error!("Report export failed: {}", e);
                self.notifier.notify_async(&Notice::generation_failed()).await;
                Err(e)
            }
        }
    }

    async fn run(&self, root: &mut ReportNode, options: &ExportOptions) -> Result<PathBuf, ReportError> {
        self.enter(ExportPhase::Waiting);
        self.settle().await;

        self.enter(ExportPhase::StyleRewrite);
        let titles = insert_section_titles(root);
        let stats = apply_print_styles(root, &self.config.theme);
        debug!(titles, ?stats, "Applied print styles");

        self.enter(ExportPhase::Rasterizing);
        let document = self
            .rasterizer
            .rasterize(root, &options.meta())
            .await?
            .ok_or(ReportError::EmptyDocument)?;

        let path = self.config.output_path();
        document.save(&path).await?;
        Ok(path)
    }

    async fn settle(&self) {
        match self.config.settle {
            SettleStrategy::Fixed(delay) => sleep(delay).await,
            SettleStrategy::Poll { interval, timeout } => {
                let Some(renderer) = &self.readiness else {
                    sleep(timeout).await;
                    return;
                };
                let deadline = Instant::now() + timeout;
                while !renderer.is_ready() {
                    if Instant::now() >= deadline {
                        debug!("Charts not ready after {:?}, capturing anyway", timeout);
                        return;
                    }
                    sleep(interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SvgChartRenderer;
    use crate::config::PrintTheme;
    use crate::print_style::{EXECUTIVE_SUMMARY, SECTION_TITLE_CLASS};
    use crate::view::{build_report_view, ReportInputs};
    use async_trait::async_trait;
    use notification_service::{MemoryChannel, NoticeKind};
    use report_core::{ChartSeries, RenderedDocument, TrendPoint};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Records what it was asked to rasterize
    #[derive(Default)]
    struct RecordingRasterizer {
        calls: AtomicUsize,
        seen: Mutex<Option<(ReportNode, DocumentMeta)>>,
    }

    #[async_trait]
    impl DocumentRasterizer for RecordingRasterizer {
        async fn rasterize(
            &self,
            root: &ReportNode,
            meta: &DocumentMeta,
        ) -> Result<Option<RenderedDocument>, ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some((root.clone(), meta.clone()));
            Ok(Some(RenderedDocument {
                bytes: b"%PDF-1.5 test".to_vec(),
                page_count: 1,
            }))
        }
    }

    struct FailingRasterizer;

    #[async_trait]
    impl DocumentRasterizer for FailingRasterizer {
        async fn rasterize(
            &self,
            _root: &ReportNode,
            _meta: &DocumentMeta,
        ) -> Result<Option<RenderedDocument>, ReportError> {
            Err(ReportError::Rasterization("canvas unavailable".to_string()))
        }
    }

    struct EmptyRasterizer;

    #[async_trait]
    impl DocumentRasterizer for EmptyRasterizer {
        async fn rasterize(
            &self,
            _root: &ReportNode,
            _meta: &DocumentMeta,
        ) -> Result<Option<RenderedDocument>, ReportError> {
            Ok(None)
        }
    }

    /// Slow rasterizer used to hold the busy flag
    struct SlowRasterizer;

    #[async_trait]
    impl DocumentRasterizer for SlowRasterizer {
        async fn rasterize(
            &self,
            _root: &ReportNode,
            _meta: &DocumentMeta,
        ) -> Result<Option<RenderedDocument>, ReportError> {
            sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    struct NeverReady;

    impl ChartRenderer for NeverReady {
        fn render(&self, series: &ChartSeries) -> ReportNode {
            SvgChartRenderer::new().render(series)
        }

        fn is_ready(&self) -> bool {
            false
        }
    }

    fn report() -> ReportNode {
        let trend = vec![TrendPoint {
            date: "Mar 1, 2024".to_string(),
            positive: 70.0,
            neutral: 20.0,
            negative: 10.0,
        }];
        let inputs = ReportInputs {
            trend: &trend,
            ..Default::default()
        };
        build_report_view(&inputs, &SvgChartRenderer::new())
    }

    fn config(dir: &std::path::Path) -> ExportConfig {
        ExportConfig {
            output_dir: dir.to_path_buf(),
            settle: SettleStrategy::Fixed(Duration::from_millis(10)),
            ..Default::default()
        }
    }

    fn exporter(
        rasterizer: Arc<dyn DocumentRasterizer>,
        config: ExportConfig,
    ) -> (DocumentExporter, MemoryChannel) {
        let memory = MemoryChannel::new();
        let notifier = NotificationService::with_channels(vec![Box::new(memory.clone())]);
        (
            DocumentExporter::new(rasterizer, Arc::new(notifier), config),
            memory,
        )
    }

    #[tokio::test]
    async fn test_missing_target_skips_rasterizer() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let (exporter, memory) = exporter(rasterizer.clone(), config(dir.path()));

        let result = exporter.export(None, &ExportOptions::default()).await;

        assert!(matches!(result, Err(ReportError::TargetNotFound)));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(memory.kinds(), vec![NoticeKind::TargetNotFound]);
        assert!(!exporter.is_busy());
        assert_eq!(exporter.phase(), ExportPhase::Failed);
    }

    #[tokio::test]
    async fn test_successful_export_saves_file() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let (exporter, memory) = exporter(rasterizer.clone(), config(dir.path()));
        let mut root = report();
        let options = ExportOptions {
            title: "Q1 Feedback".to_string(),
            date: "March 15, 2024".to_string(),
        };

        let path = exporter.export(Some(&mut root), &options).await.unwrap();

        assert_eq!(path, dir.path().join("sentiment_analysis_report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 test");
        assert_eq!(
            memory.kinds(),
            vec![
                NoticeKind::ExportStarted,
                NoticeKind::ExportSucceeded {
                    file_name: "sentiment_analysis_report.pdf".to_string()
                }
            ]
        );
        assert_eq!(exporter.phase(), ExportPhase::Saved);
        assert!(!exporter.is_busy());

        // The rasterizer saw the restyled tree and the options
        let seen = rasterizer.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.1.title, "Q1 Feedback");
        let svg = seen.0.find(&|n| n.tag == "svg").unwrap();
        assert_eq!(svg.attr("height"), Some("300"));
        assert!(seen.0.find(&|n| n.has_class(SECTION_TITLE_CLASS)).is_some());

        // The caller's tree was rewritten in place
        assert_eq!(root, seen.0);
    }

    #[tokio::test]
    async fn test_rasterizer_error_reports_generation_failed() {
        let dir = tempfile::tempdir().unwrap();
        let (exporter, memory) = exporter(Arc::new(FailingRasterizer), config(dir.path()));
        let mut root = report();

        let result = exporter.export(Some(&mut root), &ExportOptions::default()).await;

        assert!(matches!(result, Err(ReportError::Rasterization(_))));
        assert_eq!(
            memory.kinds(),
            vec![NoticeKind::ExportStarted, NoticeKind::GenerationFailed]
        );
        assert!(!dir.path().join("sentiment_analysis_report.pdf").exists());
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn test_missing_document_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (exporter, memory) = exporter(Arc::new(EmptyRasterizer), config(dir.path()));
        let mut root = report();

        let result = exporter.export(Some(&mut root), &ExportOptions::default()).await;

        assert!(matches!(result, Err(ReportError::EmptyDocument)));
        assert_eq!(memory.kinds().last(), Some(&NoticeKind::GenerationFailed));
        assert_eq!(exporter.phase(), ExportPhase::Failed);
    }

    #[tokio::test]
    async fn test_repeat_export_does_not_duplicate_titles() {
        let dir = tempfile::tempdir().unwrap();
        let (exporter, _memory) =
            exporter(Arc::new(RecordingRasterizer::default()), config(dir.path()));
        let mut root = report();

        exporter.export(Some(&mut root), &ExportOptions::default()).await.unwrap();
        let after_first = root.clone();
        exporter.export(Some(&mut root), &ExportOptions::default()).await.unwrap();

        assert_eq!(root, after_first);
        assert_eq!(
            root.count(&|n| n.text.as_deref() == Some(EXECUTIVE_SUMMARY)),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_export_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (exporter, _memory) = exporter(Arc::new(SlowRasterizer), config(dir.path()));
        let mut first = report();
        let mut second = report();
        let options = ExportOptions::default();

        let (a, b) = tokio::join!(
            exporter.export(Some(&mut first), &options),
            async {
                // let the first export take the flag
                tokio::task::yield_now().await;
                assert!(exporter.is_busy());
                exporter.export(Some(&mut second), &options).await
            }
        );

        assert!(matches!(a, Err(ReportError::EmptyDocument)));
        assert!(matches!(b, Err(ReportError::Busy)));
        assert!(!exporter.is_busy());
        // The rejected export never touched its tree
        assert_eq!(second, report());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_settle_is_bounded_by_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().to_path_buf(),
            settle: SettleStrategy::Poll {
                interval: Duration::from_millis(100),
                timeout: Duration::from_millis(1500),
            },
            theme: PrintTheme::default(),
            ..Default::default()
        };
        let (exporter, _memory) = exporter(Arc::new(RecordingRasterizer::default()), config);
        let exporter = exporter.with_readiness(Arc::new(NeverReady));
        let mut root = report();

        let started = Instant::now();
        exporter.export(Some(&mut root), &ExportOptions::default()).await.unwrap();
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(1500));
        assert!(waited < Duration::from_millis(1700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_settle_returns_when_ready() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let (exporter, _memory) = exporter(Arc::new(RecordingRasterizer::default()), config);
        let exporter = exporter.with_readiness(Arc::new(SvgChartRenderer::new()));
        let mut root = report();

        let started = Instant::now();
        exporter.export(Some(&mut root), &ExportOptions::default()).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
