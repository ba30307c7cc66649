//! Call-once memoization of the combined dataset.

use super::loader::{self, DataSources, LoadError, LoadOptions};
use crate::models::CombinedDataset;
use std::cell::OnceCell;
use tracing::debug;

/// Holds the combined dataset after the first successful load.
///
/// The load is argument-free from the caller's point of view: the sources
/// are fixed when the cache is created, so the first `get` reads them and
/// every later `get` returns the same in-memory dataset. A failed load
/// leaves the cache empty.
pub struct DatasetCache {
    sources: DataSources,
    options: LoadOptions,
    dataset: OnceCell<CombinedDataset>,
}

impl DatasetCache {
    pub fn new(sources: DataSources, options: LoadOptions) -> Self {
        Self {
            sources,
            options,
            dataset: OnceCell::new(),
        }
    }

    /// Return the dataset, loading it on first use.
    pub fn get(&self) -> Result<&CombinedDataset, LoadError> {
        if let Some(dataset) = self.dataset.get() {
            debug!("Using cached dataset ({} rows)", dataset.len());
            return Ok(dataset);
        }

        let dataset = loader::load(&self.sources, &self.options)?;
        Ok(self.dataset.get_or_init(|| dataset))
    }

    /// Whether the sources have been read.
    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }

    /// The sources this cache reads from.
    pub fn sources(&self) -> &DataSources {
        &self.sources
    }
}
