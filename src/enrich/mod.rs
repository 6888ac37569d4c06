//! Row loop and per-country driver for the classify pipeline.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::{
    classify::{classify_with_retry, Classifier, LlmClassifier, Outcome, RetryPolicy},
    config::ClassifyConfig,
    history::{Completion, History, CLASSIFIED},
    source::discover_sources,
    table::{read_csv, write_csv, write_outputs, Table},
};

pub mod record;

pub use self::record::{enriched_table, EnrichedRecord, ReviewRecord, ENRICHED_COLUMNS};

/// Message values that stand in for "no text".
const PLACEHOLDERS: [&str; 4] = ["nan", "null", "none", "(no comment)"];

/// Characters of the message kept in a skip report.
const PREVIEW_CHARS: usize = 40;

pub fn is_placeholder(message: &str) -> bool {
    let m = message.trim();
    m.is_empty() || PLACEHOLDERS.iter().any(|p| m.eq_ignore_ascii_case(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyMessage,
    RetriesExhausted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyMessage => "empty_message",
            SkipReason::RetriesExhausted => "retries_exhausted",
        }
    }
}

/// Per-row decision made before any provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum RowPlan {
    Classify(ReviewRecord),
    Skip(ReviewRecord, SkipReason),
}

/// Decide, row by row, what the loop will do. No I/O.
pub fn plan_rows(table: &Table, country: &str) -> Vec<RowPlan> {
    (0..table.len())
        .map(|row| {
            let rec = ReviewRecord::from_row(table, row, country);
            if is_placeholder(&rec.message) {
                RowPlan::Skip(rec, SkipReason::EmptyMessage)
            } else {
                RowPlan::Classify(rec)
            }
        })
        .collect()
}

/// A row left out of the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: SkipReason,
    pub attempts: usize,
    pub detail: String,
    pub message_preview: String,
}

impl SkippedRow {
    fn new(rec: &ReviewRecord, reason: SkipReason, attempts: usize, detail: String) -> Self {
        Self {
            row_index: rec.row_index,
            reason,
            attempts,
            detail,
            message_preview: rec.message.trim().chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

/// Result of running the loop over one country.
#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    pub records: Vec<EnrichedRecord>,
    pub skipped: Vec<SkippedRow>,
    /// Provider calls made, retries included.
    pub attempts: usize,
}

impl EnrichmentOutcome {
    pub fn skipped_with(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Classify every planned row in order, one call at a time.
pub async fn enrich_rows<C>(
    classifier: &C,
    plans: Vec<RowPlan>,
    policy: &RetryPolicy,
) -> EnrichmentOutcome
where
    C: Classifier + ?Sized,
{
    let mut out = EnrichmentOutcome::default();
    for plan in plans {
        match plan {
            RowPlan::Skip(rec, reason) => {
                out.skipped.push(SkippedRow::new(&rec, reason, 0, String::new()));
            }
            RowPlan::Classify(rec) => {
                let outcome = classify_with_retry(classifier, &rec.message, policy).await;
                match outcome {
                    Outcome::Classified { insights, attempts } => {
                        out.attempts += attempts;
                        out.records.push(EnrichedRecord {
                            record: rec,
                            insights,
                        });
                    }
                    Outcome::Exhausted {
                        attempts,
                        last_error,
                    } => {
                        out.attempts += attempts;
                        warn!(row = rec.row_index, attempts, "dropping row: {}", last_error);
                        out.skipped.push(SkippedRow::new(
                            &rec,
                            SkipReason::RetriesExhausted,
                            attempts,
                            last_error,
                        ));
                    }
                }
            }
        }
    }
    out
}

/// The skip report as a table.
pub fn skip_report(skipped: &[SkippedRow]) -> Table {
    let mut table = Table::new(["row_index", "reason", "attempts", "detail", "message_preview"]);
    for s in skipped {
        table.push_row(vec![
            s.row_index.to_string(),
            s.reason.as_str().to_string(),
            s.attempts.to_string(),
            s.detail.clone(),
            s.message_preview.clone(),
        ]);
    }
    table
}

/// Totals across a classify run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub countries_written: usize,
    pub countries_resumed: usize,
    pub countries_failed: usize,
    /// Countries written from only part of their sources; left out of the ledger.
    pub countries_incomplete: usize,
    pub sources_failed: usize,
    pub rows_classified: usize,
    pub rows_skipped: usize,
}

/// A country's sources, concatenated in path order.
struct CountrySources {
    table: Table,
    read: Vec<String>,
    failed: usize,
}

/// Read and concatenate a country's sources. Unreadable files are logged,
/// left out and counted.
fn load_country(paths: &[PathBuf]) -> CountrySources {
    let mut loaded = CountrySources {
        table: Table::default(),
        read: Vec::new(),
        failed: 0,
    };
    for path in paths {
        match read_csv(path) {
            Ok(t) => {
                loaded.table.append(t);
                loaded.read.push(file_name(path));
            }
            Err(e) => {
                error!(file = %path.display(), "skipping unreadable source: {:#}", e);
                loaded.failed += 1;
            }
        }
    }
    loaded
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Classify and write one country. Returns the loop outcome for the summary.
#[tracing::instrument(
    level = "info",
    skip(classifier, table, cfg, policy),
    fields(rows = table.len())
)]
async fn classify_country<C>(
    classifier: &C,
    country: &str,
    table: &Table,
    cfg: &ClassifyConfig,
    policy: &RetryPolicy,
) -> Result<EnrichmentOutcome>
where
    C: Classifier + ?Sized,
{
    let plans = plan_rows(table, country);
    let outcome = enrich_rows(classifier, plans, policy).await;

    let stem = format!("{}_classified", country);
    write_outputs(
        &enriched_table(&outcome.records),
        &record::FLOAT_COLUMNS,
        &cfg.output_dir,
        &stem,
        cfg.format,
    )?;
    let report = cfg.output_dir.join(format!("{}_skipped.csv", country));
    write_csv(&skip_report(&outcome.skipped), &report)
        .with_context(|| format!("writing {}", report.display()))?;

    info!(
        country,
        rows_read = table.len(),
        classified = outcome.records.len(),
        skipped_empty = outcome.skipped_with(SkipReason::EmptyMessage),
        skipped_exhausted = outcome.skipped_with(SkipReason::RetriesExhausted),
        calls = outcome.attempts,
        "country done"
    );
    Ok(outcome)
}

/// Classify every country under `cfg.input_dir` with `classifier`.
pub async fn classify_sources<C>(
    classifier: &C,
    cfg: &ClassifyConfig,
    policy: &RetryPolicy,
) -> Result<RunSummary>
where
    C: Classifier + ?Sized,
{
    if !cfg.input_dir.is_dir() {
        bail!("input directory {} does not exist", cfg.input_dir.display());
    }
    let history = History::new(&cfg.history_dir)?;
    let completed = if cfg.force {
        Default::default()
    } else {
        history.load_completed(CLASSIFIED)?
    };
    info!("{} countries already classified", completed.len());

    let groups = discover_sources(&cfg.input_dir)?;
    if groups.is_empty() {
        warn!(dir = %cfg.input_dir.display(), "no CSV files to classify");
    }

    let mut summary = RunSummary::default();
    for (country, paths) in groups {
        if completed.contains(&country) {
            info!(country = %country, "already classified; use --force to redo");
            summary.countries_resumed += 1;
            continue;
        }
        let CountrySources {
            table,
            read,
            failed,
        } = load_country(&paths);
        summary.sources_failed += failed;
        if read.is_empty() {
            summary.countries_failed += 1;
            continue;
        }

        match classify_country(classifier, &country, &table, cfg, policy).await {
            Ok(outcome) => {
                summary.countries_written += 1;
                summary.rows_classified += outcome.records.len();
                summary.rows_skipped += outcome.skipped.len();
                if failed > 0 {
                    // a later run must retry the unreadable files
                    warn!(
                        country = %country,
                        sources_failed = failed,
                        "partial input; not marking country as classified"
                    );
                    summary.countries_incomplete += 1;
                    continue;
                }
                let done = Completion {
                    source_files: read,
                    rows_in: table.len() as u64,
                    rows_out: outcome.records.len() as u64,
                    rows_skipped: outcome.skipped.len() as u64,
                };
                if let Err(e) = history.record_completed(&country, CLASSIFIED, &done) {
                    error!(country = %country, "failed to record completion: {:#}", e);
                }
            }
            Err(e) => {
                error!(country = %country, "write failed: {:#}", e);
                summary.countries_failed += 1;
            }
        }
    }

    info!(
        written = summary.countries_written,
        resumed = summary.countries_resumed,
        failed = summary.countries_failed,
        incomplete = summary.countries_incomplete,
        sources_failed = summary.sources_failed,
        rows_classified = summary.rows_classified,
        rows_skipped = summary.rows_skipped,
        "classify run finished"
    );
    Ok(summary)
}

/// Build the provider client from `cfg` and classify everything.
pub async fn run_classify(cfg: &ClassifyConfig) -> Result<RunSummary> {
    let policy = cfg.retry.policy()?;
    let classifier = LlmClassifier::new(&cfg.llm)?;
    info!(model = classifier.model(), max_attempts = policy.max_attempts, "classifier ready");
    classify_sources(&classifier, cfg, &policy).await
}
