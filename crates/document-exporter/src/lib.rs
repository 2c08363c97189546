//! Document Exporter
//!
//! Builds the report view, rewrites it for print and rasterizes it to a
//! saved PDF:
//! - `view`: report tree built from analysis results
//! - `chart`: built-in SVG chart renderer
//! - `print_style`: print style rewrite and section titles
//! - `pdf`: lopdf rasterizer
//! - `exporter`: the export state machine

pub mod chart;
pub mod config;
pub mod exporter;
pub mod pdf;
pub mod print_style;
pub mod view;

pub use chart::{SvgChartRenderer, CHART_WRAPPER_CLASS};
pub use config::{ExportConfig, PrintTheme, SettleStrategy, DEFAULT_FILE_NAME};
pub use exporter::{DocumentExporter, ExportOptions, ExportPhase, DEFAULT_TITLE};
pub use pdf::PdfRasterizer;
pub use print_style::{apply_print_styles, insert_section_titles, StyleStats};
pub use view::{build_report_view, ReportInputs};
