use anyhow::Result;
use clap::{Parser, Subcommand};
use review_insights::{
    clean::run_clean,
    config::{ClassifyConfig, CleanConfig},
    enrich::run_classify,
    logging::init_logging,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "review-insights",
    version,
    about = "Clean review exports and classify them with an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize raw export CSVs into one table per country
    Clean(CleanConfig),
    /// Classify every message of the cleaned tables
    Classify(ClassifyConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) env + logging ────────────────────────────────────────────
    dotenv::dotenv().ok();
    init_logging();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) parse args (flags fall back to env) ──────────────────────
    let cli = Cli::parse();

    // ─── 3) run the chosen pipeline ──────────────────────────────────
    match cli.command {
        Command::Clean(cfg) => {
            info!(input = %cfg.input_dir.display(), output = %cfg.output_dir.display(), "clean");
            let stats = run_clean(&cfg)?;
            info!(
                rows_in = stats.rows_in,
                rows_out = stats.rows_out,
                duplicates = stats.duplicates,
                empty_messages = stats.empty_messages,
                degenerate = stats.degenerate,
                "clean finished"
            );
        }
        Command::Classify(cfg) => {
            info!(input = %cfg.input_dir.display(), output = %cfg.output_dir.display(), "classify");
            run_classify(&cfg).await?;
        }
    }

    info!("all done");
    Ok(())
}
