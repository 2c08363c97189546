use async_trait::async_trait;

use crate::{ChartSeries, DocumentMeta, RenderedDocument, ReportError, ReportNode};

/// Chart rendering capability. Produces the vector-graphic subtree for a
/// series and reports whether asynchronous drawing has finished.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &ChartSeries) -> ReportNode;

    /// Readiness marker polled by the exporter before capture.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Document rasterization capability. `Ok(None)` means the rasterizer ran but
/// produced nothing worth saving.
#[async_trait]
pub trait DocumentRasterizer: Send + Sync {
    async fn rasterize(
        &self,
        root: &ReportNode,
        meta: &DocumentMeta,
    ) -> Result<Option<RenderedDocument>, ReportError>;
}
