//! Raw export spreadsheets → one normalized table per country.

use anyhow::{bail, Result};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::{
    config::CleanConfig,
    source::discover_sources,
    table::{read_csv, write_outputs, Table},
};

pub mod date_parser;
pub mod language;
pub mod platform;

use self::{
    date_parser::normalize_publish_date,
    language::standardize_language,
    platform::{is_degenerate_message, platform_from_media_type},
};

/// Columns of a cleaned table, in output order.
pub const CLEANED_COLUMNS: [&str; 10] = [
    "country",
    "platform",
    "Message",
    "text",
    "Link",
    "Publish Date",
    "Message Id",
    "Language",
    "User Name",
    "Gender",
];

/// Columns every export is treated as having, empty when absent.
const REQUIRED_COLUMNS: [&str; 4] = ["Title", "Message", "Description", "Media Type"];

/// What happened to the rows of one cleaned file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub rows_in: usize,
    pub duplicates: usize,
    pub empty_messages: usize,
    pub degenerate: usize,
    pub rows_out: usize,
}

impl CleanStats {
    fn add(&mut self, other: &CleanStats) {
        self.rows_in += other.rows_in;
        self.duplicates += other.duplicates;
        self.empty_messages += other.empty_messages;
        self.degenerate += other.degenerate;
        self.rows_out += other.rows_out;
    }
}

fn join_text(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize one raw export table for `country`.
pub fn clean_table(mut raw: Table, country: &str) -> (Table, CleanStats) {
    let mut stats = CleanStats {
        rows_in: raw.len(),
        ..Default::default()
    };

    // 1) required columns
    for name in REQUIRED_COLUMNS {
        raw.ensure_column(name);
    }
    let col = |name: &str| raw.column(name);
    let (title, message, description, media_type) = (
        col("Title").unwrap_or_default(),
        col("Message").unwrap_or_default(),
        col("Description").unwrap_or_default(),
        col("Media Type").unwrap_or_default(),
    );
    let opt_cell = |row: usize, name: &str| -> String {
        raw.column(name)
            .map(|c| raw.cell(row, c).trim().to_string())
            .unwrap_or_default()
    };

    // 2) dedupe by Message Id, last occurrence wins
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    if let Some(id_col) = raw.column("Message Id") {
        for row in 0..raw.len() {
            let id = raw.cell(row, id_col).trim();
            if !id.is_empty() {
                last_seen.insert(id.to_string(), row);
            }
        }
    }

    let mut out = Table::new(CLEANED_COLUMNS);
    for row in 0..raw.len() {
        let id = opt_cell(row, "Message Id");
        if !id.is_empty() && last_seen.get(&id) != Some(&row) {
            stats.duplicates += 1;
            continue;
        }

        let media = raw.cell(row, media_type).trim();
        let desc_cell = raw.cell(row, description);
        let desc = desc_cell.trim();
        let mut msg_cell = raw.cell(row, message);

        // 3) LinkedIn exports park the post body in Description
        if media.eq_ignore_ascii_case("linkedin mentions")
            && msg_cell.trim().eq_ignore_ascii_case("(no comment)")
            && !desc.is_empty()
        {
            msg_cell = desc_cell;
        }
        let msg = msg_cell.trim();

        if msg.is_empty() {
            stats.empty_messages += 1;
            continue;
        }
        // length is judged on the cell as exported: " k" carries two characters
        if is_degenerate_message(msg_cell) {
            stats.degenerate += 1;
            continue;
        }

        let text = join_text(&[msg, desc, raw.cell(row, title)]);
        let platform = platform_from_media_type(Some(media).filter(|m| !m.is_empty()));

        out.push_row(vec![
            country.to_string(),
            platform.to_string(),
            msg.to_string(),
            text,
            opt_cell(row, "Link"),
            normalize_publish_date(&opt_cell(row, "Publish Date")),
            id,
            standardize_language(&opt_cell(row, "Language")),
            opt_cell(row, "User Name"),
            opt_cell(row, "Gender"),
        ]);
    }
    stats.rows_out = out.len();
    (out, stats)
}

/// Clean every raw export under `cfg.input_dir`.
#[tracing::instrument(level = "info", skip(cfg), fields(input = %cfg.input_dir.display()))]
pub fn run_clean(cfg: &CleanConfig) -> Result<CleanStats> {
    if !cfg.input_dir.is_dir() {
        bail!("input directory {} does not exist", cfg.input_dir.display());
    }
    let groups = discover_sources(&cfg.input_dir)?;
    if groups.is_empty() {
        warn!(dir = %cfg.input_dir.display(), "no CSV files to clean");
    }

    let mut totals = CleanStats::default();
    for (country, paths) in groups {
        let mut combined = Table::new(CLEANED_COLUMNS);
        for path in &paths {
            let raw = match read_csv(path) {
                Ok(t) => t,
                Err(e) => {
                    error!(file = %path.display(), "skipping unreadable source: {:#}", e);
                    continue;
                }
            };
            let (cleaned, stats) = clean_table(raw, &country);
            info!(
                file = %path.display(),
                country = %country,
                rows_in = stats.rows_in,
                rows_out = stats.rows_out,
                duplicates = stats.duplicates,
                empty_messages = stats.empty_messages,
                degenerate = stats.degenerate,
                "cleaned"
            );
            totals.add(&stats);
            combined.append(cleaned);
        }

        let stem = format!("{}_cleaned", country);
        match write_outputs(&combined, &[], &cfg.output_dir, &stem, cfg.format) {
            Ok(()) => info!(country = %country, rows = combined.len(), "wrote {}", stem),
            Err(e) => error!(country = %country, "write failed: {:#}", e),
        }
    }
    Ok(totals)
}
