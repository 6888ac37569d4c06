// src/history/mod.rs

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray, TimestampMicrosecondArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use glob::glob;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    collections::HashSet,
    fs,
    fs::File,
    path::PathBuf,
    sync::Arc,
};
use tracing::debug;

/// Event name the classify pipeline records per finished country.
pub const CLASSIFIED: &str = "classified";

/// Counts attached to a completion event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub source_files: Vec<String>,
    pub rows_in: u64,
    pub rows_out: u64,
    pub rows_skipped: u64,
}

/// Completion ledger backed by single-row Parquet files.
pub struct History {
    history_dir: PathBuf,
}

impl History {
    /// Open the ledger at `history_dir`, creating the directory if needed.
    pub fn new(history_dir: impl Into<PathBuf>) -> Result<Self> {
        let history_dir = history_dir.into();
        fs::create_dir_all(&history_dir)
            .with_context(|| format!("creating history directory {:?}", &history_dir))?;
        Ok(Self { history_dir })
    }

    /// Record that `country` finished `event`.
    /// Writes `<country>_<event>_<micros>.parquet` via a staging file.
    pub fn record_completed(&self, country: &str, event: &str, done: &Completion) -> Result<()> {
        let ts = Utc::now().timestamp_micros();
        let filename = format!("{}_{}_{}.parquet", country, event, ts);
        let path = self.history_dir.join(&filename);
        let tmp = self.history_dir.join(format!(".{}.tmp", filename));

        let schema = Arc::new(Schema::new(vec![
            Field::new("country", DataType::Utf8, false),
            Field::new("event", DataType::Utf8, false),
            Field::new("source_files", DataType::Utf8, false),
            Field::new("rows_in", DataType::UInt64, false),
            Field::new("rows_out", DataType::UInt64, false),
            Field::new("rows_skipped", DataType::UInt64, false),
            Field::new(
                "finished_at",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                false,
            ),
        ]));

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![country])),
            Arc::new(StringArray::from(vec![event])),
            Arc::new(StringArray::from(vec![done.source_files.join(";")])),
            Arc::new(UInt64Array::from(vec![done.rows_in])),
            Arc::new(UInt64Array::from(vec![done.rows_out])),
            Arc::new(UInt64Array::from(vec![done.rows_skipped])),
            Arc::new(TimestampMicrosecondArray::from_iter_values(vec![ts])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns)
            .context("building history record batch")?;

        let file =
            File::create(&tmp).with_context(|| format!("creating history file {:?}", &tmp))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))
            .context("creating Arrow writer for history")?;
        writer.write(&batch).context("writing history batch")?;
        writer.close().context("closing history writer")?;
        fs::rename(&tmp, &path).with_context(|| format!("renaming {:?} -> {:?}", tmp, path))?;

        debug!(country, event, file = %filename, "recorded completion");
        Ok(())
    }

    /// Countries that have finished `event`, recovered from file names.
    pub fn load_completed(&self, event: &str) -> Result<HashSet<String>> {
        let mut set = HashSet::new();
        let pattern = format!("{}/*_{}_*.parquet", self.history_dir.display(), event);
        let marker = format!("_{}_", event);
        for path in glob(&pattern)?.flatten() {
            // stem = "<country>_<event>_<ts>"
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(idx) = stem.rfind(&marker) {
                    set.insert(stem[..idx].to_string());
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn completions_round_trip_through_file_names() -> Result<()> {
        let dir = tempdir()?;
        let history = History::new(dir.path().join("history"))?;
        assert!(history.load_completed(CLASSIFIED)?.is_empty());

        let done = Completion {
            source_files: vec!["UK_cleaned.csv".into()],
            rows_in: 10,
            rows_out: 8,
            rows_skipped: 2,
        };
        history.record_completed("UK", CLASSIFIED, &done)?;
        history.record_completed("United Kingdom", CLASSIFIED, &done)?;
        history.record_completed("France", "cleaned", &done)?;

        let completed = history.load_completed(CLASSIFIED)?;
        assert_eq!(completed.len(), 2);
        assert!(completed.contains("UK"));
        assert!(completed.contains("United Kingdom"));
        assert!(!completed.contains("France"));
        Ok(())
    }

    #[test]
    fn event_file_holds_one_row() -> Result<()> {
        let dir = tempdir()?;
        let history = History::new(dir.path())?;
        history.record_completed("UK", CLASSIFIED, &Completion::default())?;

        let path = glob(&format!("{}/UK_classified_*.parquet", dir.path().display()))?
            .flatten()
            .next()
            .expect("event file written");
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
        let rows: usize = reader.map(|b| b.map(|b| b.num_rows()).unwrap_or(0)).sum();
        assert_eq!(rows, 1);
        Ok(())
    }
}
