pub mod aggregate;
pub mod cache;
pub mod error;
pub mod pool;
pub mod report;
pub mod sampler;
pub mod store;
pub mod summary;

pub use aggregate::{aggregate_zones, quick_estimate, ZoneSample, UNIDENTIFIED_NEIGHBORHOOD};
pub use cache::CityGeocodeCache;
pub use error::PipelineError;
pub use pool::resolve_many;
pub use store::{CellValue, CsvDirStore, StoreError, TabularStore};
pub use summary::{build_root_report, RowKind, ZoneSummary};
