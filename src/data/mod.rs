/// Data layer: listing types, loading, aggregation and querying.
///
/// Architecture:
/// ```text
///  remote URI / local path
///        │  (fetched once when the cache is absent)
///        ▼
///   ┌──────────┐
///   │  loader   │  cache file (.parquet / .json / .csv) → ListingSet
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌─────────┐
///   │ aggregate  │  │  query   │  model rows → sub-model options,
///   └───────────┘  └─────────┘  sub-model selection → plotted rows
///   (model, count)
/// ```

pub mod aggregate;
pub mod error;
pub mod format;
pub mod loader;
pub mod model;
pub mod query;
