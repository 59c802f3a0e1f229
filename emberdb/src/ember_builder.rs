use crate::ember::EmberDb;
use crate::ember_config::{in_memory_text_indexer, EmberConfig};
use crate::errors::{EmberError, EmberResult};
use crate::index::TextIndexer;
use std::sync::Arc;

/// Fluent builder for [EmberDb]. The first invalid setting is remembered
/// and reported by [EmberBuilder::open].
#[derive(Default)]
pub struct EmberBuilder {
    error: Option<EmberError>,
    config: EmberConfig,
}

impl EmberBuilder {
    pub fn new() -> Self {
        EmberBuilder {
            error: None,
            config: EmberConfig::new(),
        }
    }

    pub fn build_workers(mut self, build_workers: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_build_workers(build_workers) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Uses `factory` to create each collection's text indexer.
    pub fn text_indexer<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Arc<dyn TextIndexer> + Send + Sync + 'static,
    {
        self.config.set_text_indexer(Arc::new(factory));
        self
    }

    /// Gives each collection an in-memory full-text index.
    pub fn in_memory_text_index(mut self) -> Self {
        self.config.set_text_indexer(in_memory_text_indexer());
        self
    }

    pub fn field_separator(mut self, field_separator: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_field_separator(field_separator) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> EmberResult<EmberDb> {
        if let Some(error) = self.error {
            return Err(error);
        }
        EmberDb::open(self.config)
    }
}
