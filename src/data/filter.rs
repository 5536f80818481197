use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::model::{Column, DataType, Dataset, Value};

/// Columns with fewer distinct values than this are filtered by selection.
pub const CATEGORICAL_MAX_UNIQUE: usize = 10;

// ---------------------------------------------------------------------------
// Kind – which kind of filter widget / constraint a column gets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Categorical,
    Numeric,
    Temporal,
    Text,
}

/// Infer the filter kind of a column.
///
/// The cardinality check runs first, so a rating column holding `1..=5` is
/// `Categorical` even though its values are numbers.
pub fn classify(column: &Column) -> Kind {
    if column.dtype == DataType::Categorical || column.n_unique() < CATEGORICAL_MAX_UNIQUE {
        Kind::Categorical
    } else if column.dtype.is_numeric() {
        Kind::Numeric
    } else if column.dtype.is_temporal() {
        Kind::Temporal
    } else {
        Kind::Text
    }
}

// ---------------------------------------------------------------------------
// Domains offered to the UI
// ---------------------------------------------------------------------------

/// Range and slider granularity of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericDomain {
    pub min: f64,
    pub max: f64,
    /// UI hint only; `0.0` when `min == max`.
    pub step: f64,
}

impl NumericDomain {
    pub fn of(column: &Column) -> Option<Self> {
        let (min, max) = column.numeric_bounds()?;
        Some(Self {
            min,
            max,
            step: (max - min) / 100.0,
        })
    }

    /// Pull a value left within half a step of either end back onto that end.
    ///
    /// Step rounding in a slider can turn `max` into `max - ε`, which would
    /// no longer cover the whole column.
    pub fn snap(&self, value: f64) -> f64 {
        let half = self.step / 2.0;
        if value <= self.min + half {
            self.min
        } else if value >= self.max - half {
            self.max
        } else {
            value
        }
    }
}

/// Earliest and latest calendar day in a temporal column.
pub fn date_bounds(column: &Column) -> Option<(NaiveDate, NaiveDate)> {
    column
        .temporal_bounds()
        .map(|(lo, hi)| (lo.date(), hi.date()))
}

// ---------------------------------------------------------------------------
// User input and constraints
// ---------------------------------------------------------------------------

/// How a text pattern is matched against cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMatch {
    /// Case-sensitive literal containment.
    #[default]
    Substring,
    /// Regular expression search; an invalid expression is matched literally.
    Regex,
}

/// Raw per-column input, exactly as a filter widget holds it.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnInput {
    Categories(BTreeSet<Value>),
    Range(f64, f64),
    /// Either endpoint may still be unset while the user is picking.
    Dates(Option<NaiveDate>, Option<NaiveDate>),
    Pattern(String, TextMatch),
}

impl ColumnInput {
    /// The input that filters nothing out for a column of this kind.
    pub fn default_for(column: &Column, kind: Kind) -> Self {
        match kind {
            Kind::Categorical => ColumnInput::Categories(column.distinct()),
            Kind::Numeric => match NumericDomain::of(column) {
                Some(d) => ColumnInput::Range(d.min, d.max),
                None => ColumnInput::Range(f64::NEG_INFINITY, f64::INFINITY),
            },
            Kind::Temporal => match date_bounds(column) {
                Some((lo, hi)) => ColumnInput::Dates(Some(lo), Some(hi)),
                None => ColumnInput::Dates(None, None),
            },
            Kind::Text => ColumnInput::Pattern(String::new(), TextMatch::default()),
        }
    }
}

/// A resolved row predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Categorical { allowed: BTreeSet<Value> },
    /// Inclusive on both ends.
    Numeric { min: f64, max: f64 },
    /// Inclusive on both ends.
    Temporal {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    Text { pattern: String, mode: TextMatch },
}

/// Turn widget input into a constraint.
///
/// `None` means the column is left unfiltered: a date range with only one
/// endpoint picked, an empty pattern, or input that does not fit the kind.
pub fn constraint_for(kind: Kind, input: &ColumnInput) -> Option<Constraint> {
    match (kind, input) {
        (Kind::Categorical, ColumnInput::Categories(allowed)) => Some(Constraint::Categorical {
            allowed: allowed.clone(),
        }),
        (Kind::Numeric, ColumnInput::Range(min, max)) => Some(Constraint::Numeric {
            min: *min,
            max: *max,
        }),
        (Kind::Temporal, ColumnInput::Dates(Some(start), Some(end))) => {
            Some(Constraint::Temporal {
                start: start.and_time(NaiveTime::MIN),
                end: end.and_time(end_of_day()),
            })
        }
        (Kind::Temporal, ColumnInput::Dates(..)) => None,
        (Kind::Text, ColumnInput::Pattern(pattern, mode)) if !pattern.is_empty() => {
            Some(Constraint::Text {
                pattern: pattern.clone(),
                mode: *mode,
            })
        }
        (Kind::Text, ColumnInput::Pattern(..)) => None,
        (kind, input) => {
            log::debug!("ignoring {input:?} for a {kind:?} column");
            None
        }
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

enum TextMatcher<'a> {
    Literal(&'a str),
    Pattern(Regex),
}

impl<'a> TextMatcher<'a> {
    fn new(pattern: &'a str, mode: TextMatch) -> Self {
        match mode {
            TextMatch::Substring => TextMatcher::Literal(pattern),
            TextMatch::Regex => match Regex::new(pattern) {
                Ok(re) => TextMatcher::Pattern(re),
                Err(e) => {
                    log::warn!("invalid regex '{pattern}', matching literally: {e}");
                    TextMatcher::Literal(pattern)
                }
            },
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            TextMatcher::Literal(p) => text.contains(p),
            TextMatcher::Pattern(re) => re.is_match(text),
        }
    }
}

impl Constraint {
    /// Whether the constraint lets every row of `column` through.
    /// Used to skip widgets still in their default state.
    pub fn is_identity_for(&self, column: &Column) -> bool {
        match self {
            Constraint::Categorical { allowed } => {
                column.distinct().iter().all(|v| allowed.contains(v))
            }
            Constraint::Numeric { min, max } => column
                .numeric_bounds()
                .is_some_and(|(lo, hi)| *min <= lo && hi <= *max),
            Constraint::Temporal { start, end } => column
                .temporal_bounds()
                .is_some_and(|(lo, hi)| *start <= lo && hi <= *end),
            Constraint::Text { .. } => false,
        }
    }
}

/// Keep the rows whose `column` value satisfies `constraint`.
///
/// Missing values never satisfy a categorical, numeric or temporal
/// constraint. A reversed range keeps nothing. An unknown column returns
/// the dataset unchanged.
pub fn apply_constraint(dataset: &Dataset, column: &str, constraint: &Constraint) -> Dataset {
    let Some(col) = dataset.column(column) else {
        log::warn!("filter on unknown column '{column}' ignored");
        return dataset.clone();
    };

    let keep: Vec<usize> = match constraint {
        Constraint::Categorical { allowed } => positions(col, |v| {
            !v.is_missing() && allowed.contains(v)
        }),
        Constraint::Numeric { min, max } => positions(col, |v| {
            v.as_f64().is_some_and(|x| *min <= x && x <= *max)
        }),
        Constraint::Temporal { start, end } => positions(col, |v| {
            v.as_datetime().is_some_and(|t| *start <= t && t <= *end)
        }),
        Constraint::Text { pattern, mode } => {
            let matcher = TextMatcher::new(pattern, *mode);
            positions(col, |v| matcher.is_match(&v.to_string()))
        }
    };

    log::debug!(
        "filter on '{column}': {} of {} rows kept",
        keep.len(),
        dataset.n_rows()
    );
    dataset.take(&keep)
}

fn positions(column: &Column, pred: impl Fn(&Value) -> bool) -> Vec<usize> {
    column
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| pred(v))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Everything the filter panel holds for one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    /// The "Add filters" toggle; when off the dataset passes through.
    pub enable_filtering: bool,
    /// Columns chosen for filtering, in the order they were chosen.
    pub inputs: Vec<(String, ColumnInput)>,
}

impl FilterRequest {
    pub fn new(enable_filtering: bool) -> Self {
        Self {
            enable_filtering,
            inputs: Vec::new(),
        }
    }

    pub fn with(mut self, column: impl Into<String>, input: ColumnInput) -> Self {
        self.inputs.push((column.into(), input));
        self
    }
}

/// Return the rows of `dataset` that satisfy every input in `request`.
///
/// Kinds and identity checks come from the unfiltered snapshot, so the
/// result does not depend on the order the columns were chosen in.
pub fn filter_dataset(dataset: &Dataset, request: &FilterRequest) -> Dataset {
    if !request.enable_filtering {
        return dataset.clone();
    }

    let mut current = dataset.clone();
    for (name, input) in &request.inputs {
        let Some(column) = dataset.column(name) else {
            log::warn!("filter on unknown column '{name}' ignored");
            continue;
        };
        let kind = classify(column);
        let Some(constraint) = constraint_for(kind, input) else {
            continue;
        };
        if constraint.is_identity_for(column) {
            continue;
        }
        current = apply_constraint(&current, name, &constraint);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, values: &[i64]) -> Column {
        Column::new(
            name,
            DataType::Integer,
            values.iter().map(|&v| Value::Integer(v)).collect(),
        )
    }

    fn floats(name: &str, values: &[f64]) -> Column {
        Column::new(
            name,
            DataType::Float,
            values.iter().map(|&v| Value::Float(v)).collect(),
        )
    }

    fn texts(name: &str, values: &[&str]) -> Column {
        Column::new(
            name,
            DataType::Text,
            values.iter().map(|&v| Value::Text(v.to_string())).collect(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(name: &str, n: usize) -> Column {
        Column::new(
            name,
            DataType::Date,
            (0..n)
                .map(|i| Value::Date(date(2023, 1, 1) + chrono::Days::new(i as u64)))
                .collect(),
        )
    }

    /// 20 rows: rating cycles 1..=5, pages 100..2000, read cycles through 20 days.
    fn library() -> Dataset {
        let ratings: Vec<i64> = (0..20).map(|i| i % 5 + 1).collect();
        let pages: Vec<f64> = (1..=20).map(|i| i as f64 * 100.0).collect();
        let titles: Vec<String> = (0..20).map(|i| format!("Book {i:02}")).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        Dataset::new(vec![
            texts("title", &title_refs),
            ints("rating", &ratings),
            floats("pages", &pages),
            dates("read", 20),
        ])
        .unwrap()
    }

    #[test]
    fn low_cardinality_numbers_are_categorical() {
        assert_eq!(classify(&ints("r", &[1, 2, 3, 4, 5, 5, 4, 3])), Kind::Categorical);
        assert_eq!(classify(&dates("d", 5)), Kind::Categorical);
    }

    #[test]
    fn classification_by_dtype_above_threshold() {
        let ten: Vec<i64> = (0..10).collect();
        assert_eq!(classify(&ints("n", &ten)), Kind::Numeric);
        assert_eq!(classify(&dates("d", 10)), Kind::Temporal);
        let words: Vec<String> = (0..12).map(|i| format!("w{i}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        assert_eq!(classify(&texts("t", &refs)), Kind::Text);

        let mut cat = ints("c", &ten);
        cat.dtype = DataType::Categorical;
        assert_eq!(classify(&cat), Kind::Categorical);
    }

    #[test]
    fn classify_is_deterministic() {
        let ds = library();
        for col in ds.columns() {
            assert_eq!(classify(col), classify(col));
        }
    }

    #[test]
    fn categorical_selection_keeps_original_order() {
        let ds = library();
        let allowed: BTreeSet<Value> = [Value::Integer(3), Value::Integer(5)].into();
        let req = FilterRequest::new(true).with("rating", ColumnInput::Categories(allowed));
        let out = filter_dataset(&ds, &req);

        let ratings = &out.column("rating").unwrap().values;
        assert_eq!(out.n_rows(), 8);
        assert!(ratings
            .iter()
            .all(|v| *v == Value::Integer(3) || *v == Value::Integer(5)));
        assert_eq!(out.row_labels(), &[3, 5, 8, 10, 13, 15, 18, 20]);
    }

    #[test]
    fn numeric_range_is_inclusive() {
        let ds = Dataset::new(vec![floats("x", &[1.0, 2.0, 3.0])]).unwrap();
        let out = apply_constraint(&ds, "x", &Constraint::Numeric { min: 1.0, max: 2.0 });
        assert_eq!(
            out.column("x").unwrap().values,
            vec![Value::Float(1.0), Value::Float(2.0)]
        );
    }

    #[test]
    fn reversed_range_is_empty_not_an_error() {
        let ds = library();
        let req = FilterRequest::new(true).with("pages", ColumnInput::Range(900.0, 100.0));
        let out = filter_dataset(&ds, &req);
        assert_eq!(out.n_rows(), 0);
        assert_eq!(out.column_names(), ds.column_names());
    }

    #[test]
    fn degenerate_numeric_domain_has_zero_step() {
        let col = floats("x", &[4.0; 12]);
        let dom = NumericDomain::of(&col).unwrap();
        assert_eq!(dom.step, 0.0);
        let ds = Dataset::new(vec![col]).unwrap();
        let out = apply_constraint(&ds, "x", &Constraint::Numeric { min: 4.0, max: 4.0 });
        assert_eq!(out.n_rows(), 12);
    }

    #[test]
    fn numeric_step_is_a_hundredth_of_the_range() {
        let dom = NumericDomain::of(&library().column("pages").unwrap().clone()).unwrap();
        assert_eq!((dom.min, dom.max), (100.0, 2000.0));
        assert_eq!(dom.step, 19.0);
    }

    #[test]
    fn snapping_restores_rounded_domain_ends() {
        let mut values: Vec<f64> = (0..20).map(|i| i as f64 * 10.0).collect();
        values.push(203.0);
        let dom = NumericDomain::of(&floats("pages", &values)).unwrap();
        let rounded = dom.min + ((dom.max - dom.min) / dom.step).round() * dom.step;
        assert_eq!(dom.snap(rounded), 203.0);
        assert_eq!(dom.snap(1e-12), 0.0);
        assert_eq!(dom.snap(101.5), 101.5);
    }

    #[test]
    fn fully_missing_columns_are_harmless() {
        let n = 4;
        let ds = Dataset::new(vec![
            Column::new("score", DataType::Float, vec![Value::Float(f64::NAN); n]),
            Column::new("rating", DataType::Float, vec![Value::Null; n]),
            Column::new("finished", DataType::Date, vec![Value::Null; n]),
        ])
        .unwrap();

        let mut req = FilterRequest::new(true);
        for col in ds.columns() {
            assert_eq!(classify(col), Kind::Categorical);
            let input = ColumnInput::default_for(col, classify(col));
            assert_eq!(input, ColumnInput::Categories(BTreeSet::new()));
            req = req.with(col.name.clone(), input);
        }
        assert_eq!(filter_dataset(&ds, &req), ds);

        let none = Constraint::Categorical {
            allowed: BTreeSet::new(),
        };
        assert_eq!(apply_constraint(&ds, "finished", &none).n_rows(), 0);
    }

    #[test]
    fn single_date_endpoint_leaves_column_unfiltered() {
        let ds = library();
        let req = FilterRequest::new(true)
            .with("read", ColumnInput::Dates(Some(date(2023, 1, 10)), None));
        assert_eq!(filter_dataset(&ds, &req), ds);
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = library();
        let req = FilterRequest::new(true).with(
            "read",
            ColumnInput::Dates(Some(date(2023, 1, 3)), Some(date(2023, 1, 5))),
        );
        let out = filter_dataset(&ds, &req);
        assert_eq!(out.row_labels(), &[3, 4, 5]);
    }

    #[test]
    fn date_end_covers_the_whole_day() {
        let noon = date(2023, 3, 1).and_hms_opt(12, 30, 0).unwrap();
        let col = Column::new(
            "at",
            DataType::DateTime,
            vec![Value::DateTime(noon), Value::Null],
        );
        let ds = Dataset::new(vec![col]).unwrap();
        let c = constraint_for(
            Kind::Temporal,
            &ColumnInput::Dates(Some(date(2023, 3, 1)), Some(date(2023, 3, 1))),
        )
        .unwrap();
        assert_eq!(apply_constraint(&ds, "at", &c).n_rows(), 1);
    }

    #[test]
    fn text_match_is_case_sensitive_substring() {
        let ds = Dataset::new(vec![texts("genre", &["Science Fiction", "Fantasy", "Romance"])])
            .unwrap();
        let lower = Constraint::Text {
            pattern: "fic".into(),
            mode: TextMatch::Substring,
        };
        assert_eq!(apply_constraint(&ds, "genre", &lower).n_rows(), 0);

        let upper = Constraint::Text {
            pattern: "Fic".into(),
            mode: TextMatch::Substring,
        };
        let out = apply_constraint(&ds, "genre", &upper);
        assert_eq!(out.column("genre").unwrap().values, vec![Value::Text("Science Fiction".into())]);
    }

    #[test]
    fn regex_mode_and_invalid_regex_fallback() {
        let ds = Dataset::new(vec![texts("t", &["a(b", "ab", "xyz"])]).unwrap();
        let re = Constraint::Text {
            pattern: "^a.?b$".into(),
            mode: TextMatch::Regex,
        };
        assert_eq!(apply_constraint(&ds, "t", &re).n_rows(), 2);

        let broken = Constraint::Text {
            pattern: "a(".into(),
            mode: TextMatch::Regex,
        };
        let out = apply_constraint(&ds, "t", &broken);
        assert_eq!(out.column("t").unwrap().values, vec![Value::Text("a(b".into())]);
    }

    #[test]
    fn empty_pattern_is_identity_and_missing_uses_placeholder() {
        assert_eq!(
            constraint_for(Kind::Text, &ColumnInput::Pattern(String::new(), TextMatch::Substring)),
            None
        );
        let col = Column::new("t", DataType::Text, vec![Value::Null, Value::Text("x".into())]);
        let ds = Dataset::new(vec![col]).unwrap();
        let c = Constraint::Text {
            pattern: "NA".into(),
            mode: TextMatch::Substring,
        };
        assert_eq!(apply_constraint(&ds, "t", &c).row_labels(), &[1]);
    }

    #[test]
    fn missing_values_never_match_positive_constraints() {
        let col = Column::new(
            "x",
            DataType::Float,
            vec![Value::Float(1.0), Value::Null, Value::Float(f64::NAN)],
        );
        let ds = Dataset::new(vec![col]).unwrap();
        let range = Constraint::Numeric {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        };
        assert_eq!(apply_constraint(&ds, "x", &range).n_rows(), 1);
        let set = Constraint::Categorical {
            allowed: [Value::Null, Value::Float(1.0)].into(),
        };
        assert_eq!(apply_constraint(&ds, "x", &set).n_rows(), 1);
    }

    #[test]
    fn default_inputs_are_identity() {
        let mut ds = library();
        // A column with gaps must survive its default input too.
        let mut with_gaps = floats("score", &(0..20).map(|i| i as f64).collect::<Vec<_>>());
        with_gaps.values[4] = Value::Null;
        let mut cols = ds.columns().to_vec();
        cols.push(with_gaps);
        ds = Dataset::new(cols).unwrap();

        let mut req = FilterRequest::new(true);
        for col in ds.columns() {
            req = req.with(col.name.clone(), ColumnInput::default_for(col, classify(col)));
        }
        assert_eq!(filter_dataset(&ds, &req), ds);
    }

    #[test]
    fn disabled_or_empty_request_is_identity() {
        let ds = library();
        assert_eq!(filter_dataset(&ds, &FilterRequest::default()), ds);
        assert_eq!(filter_dataset(&ds, &FilterRequest::new(true)), ds);

        let narrowing = FilterRequest::new(false).with("pages", ColumnInput::Range(0.0, 0.0));
        assert_eq!(filter_dataset(&ds, &narrowing), ds);
    }

    #[test]
    fn filter_order_does_not_matter() {
        let ds = library();
        let rating = ColumnInput::Categories([Value::Integer(1), Value::Integer(2)].into());
        let pages = ColumnInput::Range(300.0, 1500.0);

        let ab = FilterRequest::new(true)
            .with("rating", rating.clone())
            .with("pages", pages.clone());
        let ba = FilterRequest::new(true).with("pages", pages).with("rating", rating);
        let (x, y) = (filter_dataset(&ds, &ab), filter_dataset(&ds, &ba));
        assert_eq!(x, y);
        assert_eq!(x.row_labels(), &[6, 7, 11, 12]);
    }

    #[test]
    fn empty_selection_yields_empty_result() {
        let ds = library();
        let req = FilterRequest::new(true).with("rating", ColumnInput::Categories(BTreeSet::new()));
        assert_eq!(filter_dataset(&ds, &req).n_rows(), 0);
    }

    #[test]
    fn filtering_does_not_touch_the_input() {
        let ds = library();
        let before = ds.clone();
        let req = FilterRequest::new(true).with("pages", ColumnInput::Range(0.0, 500.0));
        let out = filter_dataset(&ds, &req);
        assert_eq!(out.n_rows(), 5);
        assert_eq!(ds, before);
    }
}
