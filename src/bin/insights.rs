use anyhow::Result;
use clap::Parser;
use insight_engine::{export, ingest, AnalysisConfig, InsightEngine};
use std::path::PathBuf;
use tracing::info;

/// Flag sharp period-over-period metric moves in a campaign report.
#[derive(Parser)]
#[command(name = "insights")]
#[command(about = "Campaign anomaly insights over a metrics CSV")]
struct Args {
    /// Input CSV with entity, date, and metric columns
    input: PathBuf,

    /// Analysis config JSON (entity key, metrics, mode, thresholds)
    #[arg(short, long)]
    config: PathBuf,

    /// Optional CSV file to export the insight rows to
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = AnalysisConfig::load(&args.config)?;
    info!(input = %args.input.display(), "loading report");
    let frame = ingest::read_csv(&args.input)?;

    let engine = InsightEngine::new(config);
    let insights = engine.run(&frame)?;

    if insights.is_empty() {
        println!("No anomalies detected.");
    } else {
        for insight in &insights {
            println!("{}", insight);
        }
    }

    if let Some(path) = args.output {
        export::write_insights_file(&insights, &path)?;
        println!("Saved {} insights to {}", insights.len(), path.display());
    }

    Ok(())
}
