//! Classify one review from the command line and print the validated JSON.
//!
//! ```text
//! classify-text "I love Lyca, but the app crashes every time I try to top up"
//! classify-text "Cancelled 3 months ago and still no refund, absolute scam"
//! ```
//! The first should come back as app_website_experience / app_website_issue
//! with low or medium churn risk; the second as negative, post_exit_refund,
//! cancellation_refund_issue, unresolved, high churn risk.

use anyhow::{bail, Context, Result};
use clap::Parser;
use review_insights::{
    classify::{classify_with_retry, LlmClassifier, Outcome},
    config::{LlmConfig, RetryArgs},
    logging::init_logging,
};
use std::process::exit;
use tracing::info;

#[derive(Parser)]
#[command(name = "classify-text", about = "Classify a single review text")]
struct Args {
    /// Review text to classify
    text: String,

    #[command(flatten)]
    llm: LlmConfig,

    #[command(flatten)]
    retry: RetryArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    let args = Args::parse();

    if args.text.trim().is_empty() {
        bail!("empty review text");
    }
    let policy = args.retry.policy()?;
    let classifier = LlmClassifier::new(&args.llm)?;
    info!(model = classifier.model(), "classifying");

    match classify_with_retry(&classifier, &args.text, &policy).await {
        Outcome::Classified { insights, attempts } => {
            info!(attempts, "classified");
            let json = serde_json::to_string_pretty(&insights).context("serializing result")?;
            println!("{}", json);
            Ok(())
        }
        Outcome::Exhausted {
            attempts,
            last_error,
        } => {
            eprintln!("gave up after {} attempts: {}", attempts, last_error);
            exit(2);
        }
    }
}
