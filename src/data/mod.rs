/// Data layer: typed tables, loading, filtering, and chart summaries.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (schema checked, types inferred)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────────┐
///   │ TabularFilterPipeline│  Arc<Dataset>, distinct values, bounds
///   └──────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  category AND range predicates → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary  │  series / box summaries for the charts
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod summary;
