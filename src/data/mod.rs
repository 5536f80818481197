/// Data layer: core types, loading, filtering and display formatting.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  select, rename, coerce, sort → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset │  Vec<Column>, row labels
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  classify columns, apply constraints → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  format  │  cell text for the books table
///   └──────────┘
/// ```

pub mod filter;
pub mod format;
pub mod loader;
pub mod model;
