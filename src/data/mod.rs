//! Data access: loading, caching, filtering and exporting observations.

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;

pub use cache::DatasetCache;
pub use filter::{filter, FilteredView};
pub use loader::{DataSources, LoadOptions};
