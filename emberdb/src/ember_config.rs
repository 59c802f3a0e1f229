//! Configuration of an [`EmberDb`](crate::ember::EmberDb) instance.

use crate::common::DEFAULT_FIELD_SEPARATOR;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::get_cpu_count;
use crate::index::{InMemoryTextIndexer, NoOpTextIndexer, TextIndexer};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Creates the text indexer of a collection, given the collection name.
pub type TextIndexerFactory = Arc<dyn Fn(&str) -> Arc<dyn TextIndexer> + Send + Sync>;

/// Settings fixed when a database is opened.
#[derive(Clone)]
pub struct EmberConfig {
    build_workers: usize,
    text_indexer: TextIndexerFactory,
    field_separator: String,
}

impl Default for EmberConfig {
    fn default() -> Self {
        EmberConfig::new()
    }
}

impl EmberConfig {
    pub fn new() -> Self {
        EmberConfig {
            build_workers: get_cpu_count(),
            text_indexer: Arc::new(|_: &str| Arc::new(NoOpTextIndexer) as Arc<dyn TextIndexer>),
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
        }
    }

    /// Number of threads running background index builds.
    pub fn build_workers(&self) -> usize {
        self.build_workers
    }

    pub fn set_build_workers(&mut self, build_workers: usize) -> EmberResult<()> {
        if build_workers == 0 {
            log::error!("Number of build workers must be positive");
            return Err(EmberError::new(
                "number of build workers must be positive",
                ErrorKind::ValidationError,
            ));
        }
        self.build_workers = build_workers;
        Ok(())
    }

    pub fn set_text_indexer(&mut self, factory: TextIndexerFactory) {
        self.text_indexer = factory;
    }

    /// A new text indexer for the collection `collection_name`.
    pub fn text_indexer(&self, collection_name: &str) -> Arc<dyn TextIndexer> {
        (self.text_indexer)(collection_name)
    }

    pub fn field_separator(&self) -> &str {
        &self.field_separator
    }

    pub fn set_field_separator(&mut self, separator: &str) -> EmberResult<()> {
        if separator.is_empty() {
            log::error!("Field separator cannot be empty");
            return Err(EmberError::new(
                "field separator cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        self.field_separator = separator.to_string();
        Ok(())
    }
}

impl Debug for EmberConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmberConfig")
            .field("build_workers", &self.build_workers)
            .field("field_separator", &self.field_separator)
            .finish_non_exhaustive()
    }
}

/// A factory giving every collection its own [InMemoryTextIndexer].
pub fn in_memory_text_indexer() -> TextIndexerFactory {
    Arc::new(|_: &str| Arc::new(InMemoryTextIndexer::new()) as Arc<dyn TextIndexer>)
}
