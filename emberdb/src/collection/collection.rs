use crate::collection::operation::{IndexCatalog, ReadOperations, WriteOperations};
use crate::collection::{DocId, Document, FindOptions};
use crate::common::stream::DocumentCursor;
use crate::common::TaskExecutor;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::filter::Filter;
use crate::index::{BuildState, Index, IndexOptions, TextIndexer};
use crate::store::{DocumentMap, InMemoryMap};
use parking_lot::RwLock;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A named set of documents with its indexes.
///
/// Handles are cheap to clone and share state. Once the owning database is
/// closed or the collection is dropped, every operation fails with
/// [ErrorKind::InvalidOperation].
///
/// ```rust,ignore
/// use emberdb::{doc, filter::field, index::{index_options, IndexKind}};
///
/// let users = db.collection("users")?;
/// users.insert(doc! { name: "Alice", age: 30 })?;
/// users.create_index("name", Some(index_options(IndexKind::Unique)))?;
/// let cursor = users.find(field("age").gte(18))?;
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl Collection {
    pub(crate) fn new(
        name: &str,
        text_indexer: Arc<dyn TextIndexer>,
        executor: TaskExecutor,
        db_open: Arc<AtomicBool>,
    ) -> Self {
        let document_map = DocumentMap::new(InMemoryMap::new());
        let write_lock = Arc::new(RwLock::new(()));
        let catalog = IndexCatalog::new(
            name,
            document_map.clone(),
            text_indexer,
            executor,
            write_lock.clone(),
        );

        Collection {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                reader: ReadOperations::new(catalog.clone(), document_map.clone()),
                writer: WriteOperations::new(name, catalog.clone(), document_map.clone(), write_lock),
                catalog,
                document_map,
                db_open,
                dropped: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Stores `document` under a newly allocated id and returns it. A
    /// document already carrying a non-null `_id` is rejected with
    /// [ErrorKind::InvalidId](crate::errors::ErrorKind::InvalidId).
    pub fn insert(&self, document: Document) -> EmberResult<DocId> {
        self.inner.check_open()?;
        self.inner.writer.insert(document)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> EmberResult<Vec<DocId>> {
        self.inner.check_open()?;
        self.inner.writer.insert_many(documents)
    }

    /// Merges the fields of `update` into every document matching `filter`
    /// and returns how many documents changed.
    pub fn update(&self, filter: Filter, update: &Document) -> EmberResult<usize> {
        self.inner.check_open()?;
        self.inner.writer.update(&filter, update)
    }

    pub fn update_by_id(&self, id: DocId, update: &Document) -> EmberResult<bool> {
        self.inner.check_open()?;
        self.inner.writer.update_by_id(id, update)
    }

    pub fn remove(&self, filter: Filter) -> EmberResult<usize> {
        self.inner.check_open()?;
        self.inner.writer.remove(&filter)
    }

    pub fn get_by_id(&self, id: DocId) -> EmberResult<Option<Document>> {
        self.inner.check_open()?;
        self.inner.document_map.get(&id)
    }

    pub fn size(&self) -> EmberResult<usize> {
        self.inner.check_open()?;
        self.inner.document_map.size()
    }

    /// Removes every document. Indexes stay defined and empty.
    pub fn clear(&self) -> EmberResult<()> {
        self.inner.check_open()?;
        self.inner.writer.clear()
    }

    /// Indexes `field`. Without options a non-unique index is built
    /// synchronously.
    pub fn create_index(&self, field: &str, options: Option<IndexOptions>) -> EmberResult<()> {
        self.inner.check_open()?;
        let options = options.unwrap_or_default();
        self.inner.catalog.create_index(field, &options)
    }

    pub fn rebuild_index(&self, field: &str, is_async: bool) -> EmberResult<()> {
        self.inner.check_open()?;
        self.inner.catalog.rebuild_index(field, is_async)
    }

    pub fn drop_index(&self, field: &str) -> EmberResult<()> {
        self.inner.check_open()?;
        self.inner.catalog.drop_index(field)
    }

    pub fn drop_all_indices(&self) -> EmberResult<()> {
        self.inner.check_open()?;
        self.inner.catalog.drop_all_indices()
    }

    pub fn has_index(&self, field: &str) -> EmberResult<bool> {
        self.inner.check_open()?;
        Ok(self.inner.catalog.has_index(field))
    }

    pub fn is_indexing(&self, field: &str) -> EmberResult<bool> {
        self.inner.check_open()?;
        Ok(self.inner.catalog.is_indexing(field))
    }

    pub fn list_indices(&self) -> EmberResult<Vec<Index>> {
        self.inner.check_open()?;
        Ok(self.inner.catalog.list_indices())
    }

    /// Build state of the index on `field`, `None` if there is none.
    pub fn index_status(&self, field: &str) -> EmberResult<Option<BuildState>> {
        self.inner.check_open()?;
        Ok(self.inner.catalog.index_status(field))
    }

    pub fn find(&self, filter: Filter) -> EmberResult<DocumentCursor> {
        self.find_with_options(filter, &FindOptions::default())
    }

    pub fn find_with_options(
        &self,
        filter: Filter,
        options: &FindOptions,
    ) -> EmberResult<DocumentCursor> {
        self.inner.check_open()?;
        let result = self.inner.reader.find(&filter, options)?;
        Ok(DocumentCursor::new(result))
    }

    pub fn is_dropped(&self) -> bool {
        self.inner.dropped.load(Ordering::Acquire)
    }

    /// Drops indexes and documents and invalidates every handle.
    pub(crate) fn dispose(&self) -> EmberResult<()> {
        self.inner.check_open()?;
        self.inner.catalog.drop_all_indices()?;
        self.inner.writer.clear()?;
        self.inner.dropped.store(true, Ordering::Release);
        log::info!("Dropped collection {}", self.inner.name);
        Ok(())
    }
}

impl Debug for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

struct CollectionInner {
    name: String,
    document_map: DocumentMap,
    catalog: IndexCatalog,
    reader: ReadOperations,
    writer: WriteOperations,
    db_open: Arc<AtomicBool>,
    dropped: AtomicBool,
}

impl CollectionInner {
    fn check_open(&self) -> EmberResult<()> {
        if !self.db_open.load(Ordering::Acquire) {
            log::error!("Database is closed, cannot access collection {}", self.name);
            return Err(EmberError::new(
                "database is closed",
                ErrorKind::InvalidOperation,
            ));
        }
        if self.dropped.load(Ordering::Acquire) {
            log::error!("Collection {} has been dropped", self.name);
            return Err(EmberError::new(
                &format!("collection {} has been dropped", self.name),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
