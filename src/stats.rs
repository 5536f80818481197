use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::data::loader::{LAST_DATE_READ, READ_COUNT};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Pages read per day, as logged (a day may appear more than once).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLog {
    pub entries: Vec<(NaiveDate, f64)>,
}

impl PageLog {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year 0, used as a continuous x axis.
    pub fn ordinal(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

pub fn pages_per_day(log: &PageLog) -> BTreeMap<NaiveDate, f64> {
    let mut out = BTreeMap::new();
    for &(date, pages) in &log.entries {
        *out.entry(date).or_insert(0.0) += pages;
    }
    out
}

pub fn pages_per_month(log: &PageLog) -> BTreeMap<YearMonth, f64> {
    let mut out = BTreeMap::new();
    for &(date, pages) in &log.entries {
        *out.entry(YearMonth::of(date)).or_insert(0.0) += pages;
    }
    out
}

/// Sum of `read count` per month of `last date read`.
/// Undated books are skipped; a dated book with no count adds 0.
pub fn books_per_month(books: &Dataset) -> BTreeMap<YearMonth, f64> {
    let mut out = BTreeMap::new();
    let Some(dates) = books.column(LAST_DATE_READ) else {
        return out;
    };
    let counts = books.column(READ_COUNT);

    for (i, value) in dates.values.iter().enumerate() {
        let Some(date) = value.as_date() else {
            continue;
        };
        let count = counts
            .and_then(|c| c.values[i].as_f64())
            .unwrap_or(0.0);
        *out.entry(YearMonth::of(date)).or_insert(0.0) += count;
    }
    out
}

/// Number of books per year of `last date read`.
pub fn books_per_year(books: &Dataset) -> BTreeMap<i32, usize> {
    let mut out = BTreeMap::new();
    if let Some(dates) = books.column(LAST_DATE_READ) {
        for date in dates.values.iter().filter_map(|v| v.as_date()) {
            *out.entry(date.year()).or_insert(0) += 1;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Calendar heatmap layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Column: week of the year, 0-based, weeks start on Monday.
    pub week: usize,
    /// Row: 0 = Monday.
    pub weekday: usize,
    pub value: f64,
}

/// One year of daily values laid out GitHub-style, a column per week.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
    pub year: i32,
    pub cells: Vec<CalendarCell>,
    pub n_weeks: usize,
    /// Largest daily value in the year, `0.0` for an empty year.
    pub max: f64,
}

impl CalendarGrid {
    pub fn build(daily: &BTreeMap<NaiveDate, f64>, year: i32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let offset = first.weekday().num_days_from_monday() as usize;

        let cells: Vec<CalendarCell> = first
            .iter_days()
            .take_while(|d| d.year() == year)
            .map(|date| {
                let slot = offset + date.ordinal0() as usize;
                CalendarCell {
                    date,
                    week: slot / 7,
                    weekday: slot % 7,
                    value: daily.get(&date).copied().unwrap_or(0.0),
                }
            })
            .collect();

        let n_weeks = cells.last().map_or(0, |c| c.week + 1);
        let max = cells.iter().map(|c| c.value).fold(0.0, f64::max);
        Some(Self {
            year,
            cells,
            n_weeks,
            max,
        })
    }
}

/// Distinct years present in the daily series, ascending.
pub fn years(daily: &BTreeMap<NaiveDate, f64>) -> Vec<i32> {
    let mut out: Vec<i32> = daily.keys().map(|d| d.year()).collect();
    out.dedup();
    out
}
