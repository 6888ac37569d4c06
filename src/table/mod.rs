use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use crate::config::OutputFormat;

pub mod parquet;

pub use self::parquet::write_parquet;

/// A spreadsheet held in memory as text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names, as the file states them (trimmed).
    pub headers: Vec<String>,
    /// One entry per data row; every row has `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named exactly `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, adding an all-empty column when it is missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Cell text, or "" for an out-of-range column.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// First non-empty value among the named columns, in order.
    pub fn first_value(&self, row: usize, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|n| self.column(n))
            .map(|c| self.cell(row, c).trim())
            .find(|v| !v.is_empty())
    }

    /// Push a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Append `other`'s rows, matching columns by name. Columns only `other`
    /// has are added to `self`.
    pub fn append(&mut self, other: Table) {
        if self.headers.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }
        let mapping: Vec<usize> = other
            .headers
            .iter()
            .map(|h| self.ensure_column(h))
            .collect();
        for src in other.rows {
            let mut row = vec![String::new(); self.headers.len()];
            for (cell, &dst) in src.into_iter().zip(&mapping) {
                row[dst] = cell;
            }
            self.rows.push(row);
        }
    }
}

/// Trim whitespace and strip one pair of outer quotes.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Read a CSV file with a header row. Ragged rows are padded/truncated and a
/// UTF-8 byte-order mark (common in spreadsheet exports) is dropped.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", path.display()))?
        .iter()
        .map(|h| clean_str(h.trim_start_matches('\u{feff}')))
        .collect();

    let mut table = Table::new(headers);
    for (idx, record) in rdr.records().enumerate() {
        let record = record
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        table.push_row(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// Path the writers stage into before renaming over `path`.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write `table` to `path` as CSV, atomically.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = staging_path(path);
    {
        let mut wtr = WriterBuilder::new()
            .from_path(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()
            .with_context(|| format!("flushing {}", tmp.display()))?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Write `<dir>/<stem>.csv` and/or `<dir>/<stem>.parquet` per `format`.
pub fn write_outputs(
    table: &Table,
    float_columns: &[&str],
    dir: &Path,
    stem: &str,
    format: OutputFormat,
) -> Result<()> {
    if format.csv() {
        let path = dir.join(format!("{}.csv", stem));
        write_csv(table, &path).with_context(|| format!("writing {}", path.display()))?;
    }
    if format.parquet() {
        let path = dir.join(format!("{}.parquet", stem));
        write_parquet(table, float_columns, &path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
