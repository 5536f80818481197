use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Column, DataType, Dataset, SortOrder, Value};
use crate::stats::PageLog;

/// Source columns read from a reading-log export, in display order.
pub const SOURCE_COLUMNS: [&str; 7] = [
    "Title",
    "Authors",
    "Read Status",
    "Last Date Read",
    "Read Count",
    "Star Rating",
    "Tags",
];

/// Column (after renaming and lowercasing) the books table is sorted by.
pub const LAST_DATE_READ: &str = "last date read";
pub const READ_COUNT: &str = "read count";

const READ_STATUS: &str = "Read Status";
const DATE_FORMATS: [&str; 3] = ["%Y/%m/%d", "%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
}

/// Raw string cells from any source format; `None` is an empty / null cell.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    fn index_of(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()).into())
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the books dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one book per line
/// * `.json`    – `[{ "Title": ..., "Authors": ..., ... }, ...]`
/// * `.parquet` – one column per source field, any scalar type
///
/// Only rows with `Read Status == "read"` are kept; the status column is
/// dropped, `Authors` becomes `author` and every name is lowercased. Rows
/// are sorted by `last date read` (missing dates last) and labelled 1..n.
pub fn load_books(path: &Path, order: SortOrder) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!(LoadError::UnsupportedExtension(other.to_string())),
    };

    build_books(&raw, order).with_context(|| format!("building books from {}", path.display()))
}

/// Load daily page counts from a CSV with `Dates` and `Pages` columns.
/// Rows whose date or page count cannot be parsed are skipped.
pub fn load_page_log(path: &Path) -> Result<PageLog> {
    let raw = read_csv(path)?;
    let date_idx = raw.index_of("Dates")?;
    let pages_idx = raw.index_of("Pages")?;

    let mut entries = Vec::with_capacity(raw.rows.len());
    for (row_no, row) in raw.rows.iter().enumerate() {
        let date = row[date_idx].as_deref().and_then(parse_date);
        let pages = row[pages_idx]
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok());
        match (date, pages) {
            (Some(d), Some(p)) => entries.push((d, p)),
            _ => log::warn!("page log row {row_no}: skipped unparseable {row:?}"),
        }
    }
    Ok(PageLog { entries })
}

// ---------------------------------------------------------------------------
// Books transform
// ---------------------------------------------------------------------------

fn build_books(raw: &RawTable, order: SortOrder) -> Result<Dataset> {
    let indices = SOURCE_COLUMNS
        .iter()
        .map(|name| raw.index_of(name))
        .collect::<Result<Vec<_>>>()?;
    let status_idx = raw.index_of(READ_STATUS)?;

    let read_rows: Vec<&Vec<Option<String>>> = raw
        .rows
        .iter()
        .filter(|row| row[status_idx].as_deref().map(str::trim) == Some("read"))
        .collect();

    let mut columns = Vec::with_capacity(SOURCE_COLUMNS.len() - 1);
    for (name, &idx) in SOURCE_COLUMNS.iter().zip(&indices) {
        if *name == READ_STATUS {
            continue;
        }
        let mut dtype = source_type(name);
        let mut values: Vec<Value> = read_rows
            .iter()
            .map(|row| parse_cell(row[idx].as_deref(), dtype))
            .collect();
        if dtype == DataType::Date && values.iter().any(|v| matches!(v, Value::DateTime(_))) {
            promote_dates(&mut values);
            dtype = DataType::DateTime;
        }
        let display_name = if *name == "Authors" { "Author" } else { *name };
        columns.push(Column::new(display_name.to_lowercase(), dtype, values));
    }

    let dataset = Dataset::new(columns)?
        .sort_by(LAST_DATE_READ, order)
        .relabel();
    Ok(dataset)
}

fn source_type(name: &str) -> DataType {
    match name {
        "Last Date Read" => DataType::Date,
        "Read Count" => DataType::Integer,
        "Star Rating" => DataType::Float,
        _ => DataType::Text,
    }
}

/// Lenient cell parse: anything that does not fit the type becomes `Null`.
fn parse_cell(cell: Option<&str>, dtype: DataType) -> Value {
    let Some(s) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Value::Null;
    };
    let parsed = match dtype {
        DataType::Float => s.parse::<f64>().ok().map(Value::Float),
        DataType::Integer => s
            .parse::<i64>()
            .ok()
            .or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Value::Integer),
        DataType::Date | DataType::DateTime => parse_timestamp(s),
        DataType::Categorical | DataType::Text => Some(Value::Text(s.to_string())),
    };
    parsed.unwrap_or(Value::Null)
}

/// Parse a calendar day from the date formats seen in reading-log exports.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    parse_timestamp(s).and_then(|v| v.as_date())
}

/// A `Date`, or a `DateTime` when the cell carries a time other than midnight.
fn parse_timestamp(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(Value::Date(d));
    }
    let dt = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())?;
    Some(if dt.time() == NaiveTime::MIN {
        Value::Date(dt.date())
    } else {
        Value::DateTime(dt)
    })
}

/// Dates become midnight timestamps so the column sorts as one type.
fn promote_dates(values: &mut [Value]) {
    for v in values {
        if let Value::Date(d) = v {
            *v = Value::DateTime(d.and_time(NaiveTime::MIN));
        }
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = (0..headers.len())
            .map(|i| record.get(i).filter(|s| !s.is_empty()).map(str::to_string))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let row = headers
            .iter()
            .map(|h| obj.get(h).and_then(json_to_cell))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read every column of a Parquet file as display text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| {
                    if col.is_null(row) {
                        Ok(None)
                    } else {
                        array_value_to_string(col, row).map(Some)
                    }
                })
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Row {row}: failed to read cells"))?;
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const BOOKS_CSV: &str = "\
Title,Authors,ISBN,Read Status,Last Date Read,Read Count,Star Rating,Tags
Dune,Frank Herbert,1,read,2023/03/02,1,4.5,sci-fi
Emma,Jane Austen,2,to-read,,0,,classic
Neuromancer,William Gibson,3,read,2022/11/20,2,4.25,sci-fi
Middlemarch,George Eliot,4,read,not a date,1,n/a,classic
";

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_books_are_selected_renamed_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "book_stats.csv", BOOKS_CSV);
        let ds = load_books(&path, SortOrder::Ascending).unwrap();

        assert_eq!(
            ds.column_names(),
            vec!["title", "author", "last date read", "read count", "star rating", "tags"]
        );
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.row_labels(), &[1, 2, 3]);

        let titles: Vec<String> = ds
            .column("title")
            .unwrap()
            .values
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(titles, vec!["Neuromancer", "Dune", "Middlemarch"]);

        let ratings = &ds.column("star rating").unwrap().values;
        assert_eq!(ratings[0], Value::Float(4.25));
        assert_eq!(ratings[2], Value::Null);
        assert_eq!(ds.column(LAST_DATE_READ).unwrap().values[2], Value::Null);
        assert_eq!(ds.column("author").unwrap().dtype, DataType::Text);
    }

    #[test]
    fn descending_order_keeps_missing_dates_last() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "book_stats.csv", BOOKS_CSV);
        let ds = load_books(&path, SortOrder::Descending).unwrap();
        let first = &ds.column("title").unwrap().values[0];
        let last = &ds.column("title").unwrap().values[2];
        assert_eq!(first, &Value::Text("Dune".into()));
        assert_eq!(last, &Value::Text("Middlemarch".into()));
    }

    #[test]
    fn json_records_load_like_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "books.json",
            r#"[
                {"Title": "Dune", "Authors": "Frank Herbert", "Read Status": "read",
                 "Last Date Read": "2023-03-02", "Read Count": 1, "Star Rating": 4.5, "Tags": null},
                {"Title": "Emma", "Authors": "Jane Austen", "Read Status": "did-not-finish",
                 "Last Date Read": null, "Read Count": 0, "Star Rating": null, "Tags": "classic"}
            ]"#,
        );
        let ds = load_books(&path, SortOrder::Ascending).unwrap();
        assert_eq!(ds.n_rows(), 1);
        assert_eq!(ds.column(READ_COUNT).unwrap().values[0], Value::Integer(1));
        assert_eq!(ds.column("tags").unwrap().values[0], Value::Null);
        assert_eq!(
            ds.column(LAST_DATE_READ).unwrap().values[0],
            Value::Date(NaiveDate::from_ymd_opt(2023, 3, 2).unwrap())
        );
    }

    #[test]
    fn parquet_books_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.parquet");

        let text_field = |name: &str| Field::new(name, arrow::datatypes::DataType::Utf8, true);
        let schema = Arc::new(Schema::new(vec![
            text_field("Title"),
            text_field("Authors"),
            text_field("Read Status"),
            text_field("Last Date Read"),
            Field::new("Read Count", arrow::datatypes::DataType::Float64, true),
            Field::new("Star Rating", arrow::datatypes::DataType::Float64, true),
            text_field("Tags"),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Dune", "Emma"])),
                Arc::new(StringArray::from(vec!["Frank Herbert", "Jane Austen"])),
                Arc::new(StringArray::from(vec!["read", "read"])),
                Arc::new(StringArray::from(vec![Some("2023/03/02"), None])),
                Arc::new(Float64Array::from(vec![1.0, 3.0])),
                Arc::new(Float64Array::from(vec![Some(4.5), None])),
                Arc::new(StringArray::from(vec![Some("sci-fi"), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_books(&path, SortOrder::Ascending).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(
            ds.column(READ_COUNT).unwrap().values,
            vec![Value::Integer(1), Value::Integer(3)]
        );
        assert_eq!(ds.column("star rating").unwrap().values[1], Value::Null);
    }

    #[test]
    fn missing_source_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "b.csv", "Title,Authors\nDune,Frank Herbert\n");
        let err = load_books(&path, SortOrder::Ascending).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<LoadError>(),
            Some(LoadError::MissingColumn(c)) if c == "Read Status"
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_books(Path::new("books.xlsx"), SortOrder::Ascending).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn page_log_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "pages.csv",
            "Dates,Pages\n2023-01-01,30\n2023-01-02,abc\noops,12\n2023/01/03,45.5\n",
        );
        let log = load_page_log(&path).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
        assert_eq!(log.entries, vec![(d(1), 30.0), (d(3), 45.5)]);
    }

    #[test]
    fn times_of_day_make_the_date_column_a_datetime() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "book_stats.csv",
            "\
Title,Authors,Read Status,Last Date Read,Read Count,Star Rating,Tags
Dune,Frank Herbert,read,2023-03-02T21:15:00,1,4.5,sci-fi
Emma,Jane Austen,read,2023/01/10,1,4,classic
",
        );
        let ds = load_books(&path, SortOrder::Ascending).unwrap();
        let col = ds.column(LAST_DATE_READ).unwrap();
        assert_eq!(col.dtype, DataType::DateTime);
        let day = |m, d| NaiveDate::from_ymd_opt(2023, m, d).unwrap();
        assert_eq!(
            col.values,
            vec![
                Value::DateTime(day(1, 10).and_time(NaiveTime::MIN)),
                Value::DateTime(day(3, 2).and_hms_opt(21, 15, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn out_of_range_read_counts_are_missing() {
        assert_eq!(parse_cell(Some("3.0"), DataType::Integer), Value::Integer(3));
        assert_eq!(parse_cell(Some("1e300"), DataType::Integer), Value::Null);
        assert_eq!(parse_cell(Some("-1e19"), DataType::Integer), Value::Null);
        assert_eq!(parse_cell(Some("2.5"), DataType::Integer), Value::Null);
    }

    #[test]
    fn lenient_date_formats() {
        let want = NaiveDate::from_ymd_opt(2021, 7, 9);
        assert_eq!(parse_date("2021/07/09"), want);
        assert_eq!(parse_date("2021-07-09"), want);
        assert_eq!(parse_date("09/07/2021"), want);
        assert_eq!(parse_date("2021-07-09 18:00:00"), want);
        assert_eq!(parse_date("2021-07-09T00:00:00"), want);
        assert_eq!(parse_date("July 9th"), None);
    }
}
