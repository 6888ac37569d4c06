use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    path::Path,
    sync::Arc,
};

use super::{staging_path, Table};

/// Arrow schema for `table`: every column nullable Utf8, except the ones
/// named in `float_columns`, which are Float64.
pub fn arrow_schema(table: &Table, float_columns: &[&str]) -> Schema {
    let fields: Vec<Field> = table
        .headers
        .iter()
        .map(|h| {
            let dt = if float_columns.contains(&h.as_str()) {
                DataType::Float64
            } else {
                DataType::Utf8
            };
            Field::new(h, dt, true)
        })
        .collect();
    Schema::new(fields)
}

fn column_array(table: &Table, col: usize, dt: &DataType) -> ArrayRef {
    let cells = table.rows.iter().map(|r| r[col].trim());
    match dt {
        DataType::Float64 => Arc::new(
            cells
                .map(|s| s.parse::<f64>().ok())
                .collect::<Float64Array>(),
        ),
        _ => Arc::new(
            cells
                .map(|s| if s.is_empty() { None } else { Some(s) })
                .collect::<StringArray>(),
        ),
    }
}

/// Write `table` to `path` as a single-row-group Parquet file, atomically.
/// Empty cells become nulls; unparsable numbers in Float64 columns too.
pub fn write_parquet<P: AsRef<Path>>(table: &Table, float_columns: &[&str], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let schema = Arc::new(arrow_schema(table, float_columns));
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| column_array(table, i, f.data_type()))
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .with_context(|| format!("building record batch for {}", path.display()))?;

    let tmp = staging_path(path);
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .context("creating Arrow writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing Parquet writer")?;

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn writes_typed_nullable_columns() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.parquet");
        let mut table = Table::new(["message", "sentiment_score"]);
        table.push_row(vec!["good".into(), "0.8".into()]);
        table.push_row(vec!["".into(), "n/a".into()]);
        write_parquet(&table, &["sentiment_score"], &path)?;

        let file = File::open(&path)?;
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batch = reader.next().expect("one batch")?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Float64);

        let msgs = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(msgs.value(0), "good");
        assert!(msgs.is_null(1));

        let scores = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(scores.value(0), 0.8);
        assert!(scores.is_null(1));
        Ok(())
    }
}
