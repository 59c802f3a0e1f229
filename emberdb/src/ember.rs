use crate::collection::Collection;
use crate::common::{TaskExecutor, EMBERDB_VERSION};
use crate::ember_builder::EmberBuilder;
use crate::ember_config::EmberConfig;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::FIELD_SEPARATOR;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An embedded document database: a registry of named collections sharing
/// one configuration and one pool of background index-build workers.
///
/// Handles are cheap to clone and share state. After [EmberDb::close]
/// every operation on the database or its collections fails with
/// [ErrorKind::InvalidOperation].
///
/// ```rust,ignore
/// use emberdb::ember::EmberDb;
///
/// let db = EmberDb::builder().build_workers(2).in_memory_text_index().open()?;
/// let notes = db.collection("notes")?;
/// db.close()?;
/// ```
#[derive(Clone)]
pub struct EmberDb {
    inner: Arc<EmberDbInner>,
}

impl EmberDb {
    pub fn builder() -> EmberBuilder {
        EmberBuilder::new()
    }

    pub(crate) fn open(config: EmberConfig) -> EmberResult<EmberDb> {
        *FIELD_SEPARATOR.write() = config.field_separator().to_string();
        let executor = TaskExecutor::new(config.build_workers())?;
        log::info!("Opened EmberDb {} with {:?}", EMBERDB_VERSION, config);

        Ok(EmberDb {
            inner: Arc::new(EmberDbInner {
                config,
                executor,
                collections: DashMap::new(),
                open: Arc::new(AtomicBool::new(true)),
            }),
        })
    }

    pub fn config(&self) -> &EmberConfig {
        &self.inner.config
    }

    /// The collection named `name`, created on first use.
    pub fn collection(&self, name: &str) -> EmberResult<Collection> {
        self.inner.check_open()?;
        if name.is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(EmberError::new(
                "collection name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        let collection = self
            .inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::info!("Creating collection {}", name);
                Collection::new(
                    name,
                    self.inner.config.text_indexer(name),
                    self.inner.executor.clone(),
                    self.inner.open.clone(),
                )
            })
            .clone();
        Ok(collection)
    }

    pub fn has_collection(&self, name: &str) -> EmberResult<bool> {
        self.inner.check_open()?;
        Ok(self.inner.collections.contains_key(name))
    }

    /// Names of all collections, sorted.
    pub fn list_collection_names(&self) -> EmberResult<Vec<String>> {
        self.inner.check_open()?;
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Removes the collection with its documents and indexes. Existing
    /// handles to it become unusable.
    pub fn drop_collection(&self, name: &str) -> EmberResult<()> {
        self.inner.check_open()?;
        match self.inner.collections.remove(name) {
            Some((_, collection)) => collection.dispose(),
            None => {
                log::error!("Collection {} does not exist", name);
                Err(EmberError::new(
                    &format!("collection {} does not exist", name),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Closes the database, waiting for queued background builds to finish.
    /// Closing a closed database is a no-op.
    pub fn close(&self) -> EmberResult<()> {
        if !self.inner.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        self.inner.executor.shutdown();
        self.inner.collections.clear();
        log::info!("Closed database");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        !self.inner.open.load(Ordering::Acquire)
    }
}

struct EmberDbInner {
    config: EmberConfig,
    executor: TaskExecutor,
    collections: DashMap<String, Collection>,
    open: Arc<AtomicBool>,
}

impl EmberDbInner {
    fn check_open(&self) -> EmberResult<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            log::error!("Database is closed");
            Err(EmberError::new("database is closed", ErrorKind::InvalidOperation))
        }
    }
}
