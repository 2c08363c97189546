//! Sentiment report CLI
//!
//! Usage:
//!   sentiment-report normalize (--key-phrases <file> | --aspects <file>)
//!   sentiment-report trend <reviews.json>
//!   sentiment-report insights <analysis.json>
//!   sentiment-report recommendations <analysis.json>
//!   sentiment-report export <analysis.json> [--reviews f] [--key-phrases f] [--title t] [--output-dir d]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use document_exporter::{
    build_report_view, DocumentExporter, ExportConfig, ExportOptions, PdfRasterizer, ReportInputs,
    SvgChartRenderer,
};
use insight_engine::{generate_insights, generate_recommendations};
use notification_service::{NotificationConfig, NotificationService};
use sentiment_analysis::{aggregate_trend, normalize_aspects, normalize_key_phrases};

mod input;

use input::{read_analysis, read_records};

#[derive(Parser)]
#[command(
    name = "sentiment-report",
    version,
    about = "Sentiment analysis reports: normalization, insights and PDF export"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw key phrase or aspect records and print them as JSON
    Normalize(NormalizeArgs),
    /// Aggregate reviews into a per-day sentiment trend
    Trend {
        /// JSON array of reviews
        reviews: PathBuf,
    },
    /// Print insights for an analysis result, one per line
    Insights {
        /// Analysis result JSON
        analysis: PathBuf,
    },
    /// Print recommendations for an analysis result, one per line
    Recommendations {
        /// Analysis result JSON
        analysis: PathBuf,
    },
    /// Build the report and export it as a PDF
    Export {
        /// Analysis result JSON
        analysis: PathBuf,
        /// Reviews for the trend chart
        #[arg(long)]
        reviews: Option<PathBuf>,
        /// Key phrases for the key phrase list
        #[arg(long)]
        key_phrases: Option<PathBuf>,
        /// Document title
        #[arg(long)]
        title: Option<String>,
        /// Overrides REPORT_OUTPUT_DIR
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct NormalizeArgs {
    /// Key phrase records (strings or objects)
    #[arg(long)]
    key_phrases: Option<PathBuf>,
    /// Aspect records
    #[arg(long)]
    aspects: Option<PathBuf>,
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so JSON output on stdout stays clean
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => normalize(args),
        Commands::Trend { reviews } => {
            let reviews = read_records(&reviews, "reviews")?;
            print_json(&aggregate_trend(&reviews))
        }
        Commands::Insights { analysis } => {
            let input = read_analysis(&analysis)?;
            print_lines(&generate_insights(Some(&input.data)));
            Ok(())
        }
        Commands::Recommendations { analysis } => {
            let input = read_analysis(&analysis)?;
            print_lines(&generate_recommendations(Some(&input.data)));
            Ok(())
        }
        Commands::Export {
            analysis,
            reviews,
            key_phrases,
            title,
            output_dir,
        } => export(analysis, reviews, key_phrases, title, output_dir).await,
    }
}

fn normalize(args: NormalizeArgs) -> Result<()> {
    match (args.key_phrases, args.aspects) {
        (Some(path), _) => print_json(&normalize_key_phrases(&read_records(&path, "keyPhrases")?)),
        (None, Some(path)) => print_json(&normalize_aspects(&read_records(&path, "aspects")?)),
        (None, None) => anyhow::bail!("Pass --key-phrases or --aspects"),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

async fn export(
    analysis: PathBuf,
    reviews: Option<PathBuf>,
    key_phrases: Option<PathBuf>,
    title: Option<String>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = ExportConfig::from_env().context("Invalid export configuration")?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    tracing::info!(
        "Exporting to {} (settle: {:?})",
        config.output_path().display(),
        config.settle
    );

    let input = read_analysis(&analysis)?;
    let trend = match reviews {
        Some(path) => aggregate_trend(&read_records(&path, "reviews")?),
        None => Vec::new(),
    };
    let key_phrases = match key_phrases {
        Some(path) => normalize_key_phrases(&read_records(&path, "keyPhrases")?),
        None => Vec::new(),
    };
    let aspects = normalize_aspects(&input.raw_aspects);
    let insights = generate_insights(Some(&input.data));
    let recommendations = generate_recommendations(Some(&input.data));

    let renderer = Arc::new(SvgChartRenderer::new());
    let mut report = build_report_view(
        &ReportInputs {
            analysis: Some(&input.data),
            trend: &trend,
            key_phrases: &key_phrases,
            aspects: &aspects,
            insights: &insights,
            recommendations: &recommendations,
        },
        renderer.as_ref(),
    );

    let notifier = NotificationService::new(&NotificationConfig::from_env());
    let exporter = DocumentExporter::new(Arc::new(PdfRasterizer::new()), Arc::new(notifier), config)
        .with_readiness(renderer);

    let options = match title {
        Some(title) => ExportOptions::default().with_title(title),
        None => ExportOptions::default(),
    };
    let path = exporter
        .export(Some(&mut report), &options)
        .await
        .context("Report export failed")?;

    println!("{}", path.display());
    Ok(())
}
