use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;

use crate::config::{DashboardConfig, Tab};
use crate::data::filter::{classify, filter_dataset, ColumnInput, FilterRequest, Kind};
use crate::data::format::DisplayTable;
use crate::data::loader::{load_books, load_page_log};
use crate::data::model::{Dataset, SortOrder, Value};
use crate::stats::{self, PageLog, YearMonth};

// ---------------------------------------------------------------------------
// Chart data, recomputed only when a dataset is (re)loaded
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StatsView {
    pub pages_per_day: BTreeMap<NaiveDate, f64>,
    pub pages_per_month: BTreeMap<YearMonth, f64>,
    pub books_per_month: BTreeMap<YearMonth, f64>,
    pub books_per_year: BTreeMap<i32, usize>,
}

/// A file the dashboard loads; each keeps its own load error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Books,
    PageLog,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Books with status "read" (None until a file is loaded).
    pub books: Option<Dataset>,

    pub page_log: PageLog,

    pub stats: StatsView,

    pub tab: Tab,

    pub sort_order: SortOrder,

    /// The "Add filters" toggle.
    pub enable_filtering: bool,

    /// Columns picked for filtering, in pick order.
    pub filter_columns: Vec<String>,

    /// Widget state per picked column.
    pub inputs: BTreeMap<String, ColumnInput>,

    /// Rendered rows passing the current filters (cached).
    pub table: DisplayTable,

    /// Last load error per source, shown in the top bar.
    pub load_errors: BTreeMap<Source, String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            books: None,
            page_log: PageLog::default(),
            stats: StatsView::default(),
            tab: config.initial_tab,
            sort_order: config.sort_order,
            enable_filtering: false,
            filter_columns: Vec::new(),
            inputs: BTreeMap::new(),
            table: DisplayTable::default(),
            load_errors: BTreeMap::new(),
        }
    }

    /// State with the files named in the config already loaded.
    pub fn from_config(config: &DashboardConfig) -> Self {
        let mut state = Self::new(config);
        if let Some(path) = &config.books_path {
            state.open_books(path);
        }
        if let Some(path) = &config.page_log_path {
            state.open_page_log(path);
        }
        state
    }

    pub fn open_books(&mut self, path: &Path) {
        match load_books(path, self.sort_order) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} books with columns {:?} from {}",
                    dataset.n_rows(),
                    dataset.column_names(),
                    path.display()
                );
                self.set_books(dataset);
            }
            Err(e) => {
                log::error!("Failed to load books: {e:#}");
                self.load_errors.insert(Source::Books, format!("Error: {e:#}"));
            }
        }
    }

    pub fn open_page_log(&mut self, path: &Path) {
        match load_page_log(path) {
            Ok(page_log) => {
                log::info!(
                    "Loaded {} page log entries from {}",
                    page_log.entries.len(),
                    path.display()
                );
                self.set_page_log(page_log);
            }
            Err(e) => {
                log::error!("Failed to load page log: {e:#}");
                self.load_errors
                    .insert(Source::PageLog, format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded books dataset and reset the filters.
    pub fn set_books(&mut self, dataset: Dataset) {
        self.stats.books_per_month = stats::books_per_month(&dataset);
        self.stats.books_per_year = stats::books_per_year(&dataset);
        self.filter_columns.clear();
        self.inputs.clear();
        self.books = Some(dataset);
        self.load_errors.remove(&Source::Books);
        self.refilter();
    }

    pub fn set_page_log(&mut self, page_log: PageLog) {
        self.stats.pages_per_day = stats::pages_per_day(&page_log);
        self.stats.pages_per_month = stats::pages_per_month(&page_log);
        self.page_log = page_log;
        self.load_errors.remove(&Source::PageLog);
    }

    /// Every outstanding load error, books first.
    pub fn status_message(&self) -> Option<String> {
        if self.load_errors.is_empty() {
            return None;
        }
        let messages: Vec<&str> = self.load_errors.values().map(String::as_str).collect();
        Some(messages.join("  |  "))
    }

    /// Current widget state as an engine request.
    pub fn request(&self) -> FilterRequest {
        self.filter_columns
            .iter()
            .filter_map(|col| Some((col, self.inputs.get(col)?)))
            .fold(FilterRequest::new(self.enable_filtering), |req, (col, input)| {
                req.with(col.clone(), input.clone())
            })
    }

    /// Recompute `table` after a filter change.
    pub fn refilter(&mut self) {
        self.table = match &self.books {
            Some(books) => DisplayTable::from_dataset(&filter_dataset(books, &self.request())),
            None => DisplayTable::default(),
        };
    }

    pub fn kind_of(&self, column: &str) -> Option<Kind> {
        self.books.as_ref()?.column(column).map(classify)
    }

    pub fn set_filtering(&mut self, enabled: bool) {
        self.enable_filtering = enabled;
        self.refilter();
    }

    /// Pick a column for filtering, starting from its identity input.
    pub fn add_filter_column(&mut self, column: &str) {
        if self.filter_columns.iter().any(|c| c == column) {
            return;
        }
        let Some(col) = self.books.as_ref().and_then(|b| b.column(column)) else {
            return;
        };
        let input = ColumnInput::default_for(col, classify(col));
        self.inputs.insert(column.to_string(), input);
        self.filter_columns.push(column.to_string());
        self.refilter();
    }

    pub fn remove_filter_column(&mut self, column: &str) {
        self.filter_columns.retain(|c| c != column);
        self.inputs.remove(column);
        self.refilter();
    }

    /// Toggle a single value in a categorical column's selection.
    pub fn toggle_category(&mut self, column: &str, value: &Value) {
        if let Some(ColumnInput::Categories(selected)) = self.inputs.get_mut(column) {
            if !selected.remove(value) {
                selected.insert(value.clone());
            }
            self.refilter();
        }
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        let all = self
            .books
            .as_ref()
            .and_then(|b| b.column(column))
            .map(|c| c.distinct());
        if let Some(all) = all {
            self.inputs
                .insert(column.to_string(), ColumnInput::Categories(all));
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.inputs
            .insert(column.to_string(), ColumnInput::Categories(BTreeSet::new()));
        self.refilter();
    }

    /// Replace a column's input wholesale (sliders, date pickers, text box).
    pub fn set_input(&mut self, column: &str, input: ColumnInput) {
        if self.inputs.get(column) != Some(&input) {
            self.inputs.insert(column.to_string(), input);
            self.refilter();
        }
    }
}
