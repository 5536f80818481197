use super::model::{Dataset, Value};

/// Header of the row-label column shown first in the books table.
pub const ORDER_HEADER: &str = "order";
/// Float column shown with two decimals.
pub const STAR_RATING: &str = "star rating";

// ---------------------------------------------------------------------------
// DisplayTable – pre-rendered cell text for the books table
// ---------------------------------------------------------------------------

/// Cell text for a dataset, built after filtering so formatting never
/// feeds back into comparisons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut headers = Vec::with_capacity(dataset.columns().len() + 1);
        headers.push(ORDER_HEADER.to_string());
        headers.extend(dataset.column_names());

        let rows = dataset
            .row_labels()
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let mut row = Vec::with_capacity(headers.len());
                row.push(label.to_string());
                for col in dataset.columns() {
                    row.push(format_cell(&col.name, &col.values[i]));
                }
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn format_cell(column: &str, value: &Value) -> String {
    match value {
        v if v.is_missing() => String::new(),
        Value::Float(f) if column == STAR_RATING => format!("{f:.2}"),
        other => other.to_string(),
    }
}
