use crate::collection::{DocId, Document};
use crate::common::{TaskExecutor, Value, DOC_ID};
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::index::{
    BuildPermit, BuildState, BuildTracker, Index, IndexKind, IndexOptions, TextIndexer, ValueIndex,
};
use crate::store::DocumentMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const BUILD_CHUNK_SIZE: usize = 256;

struct IndexEntry {
    descriptor: Index,
    data: Option<Arc<ValueIndex>>,
    generation: u64,
}

impl IndexEntry {
    fn building(field: &str, kind: IndexKind, generation: u64) -> Self {
        let data = match kind {
            IndexKind::Unique => Some(Arc::new(ValueIndex::new(field, true))),
            IndexKind::NonUnique => Some(Arc::new(ValueIndex::new(field, false))),
            IndexKind::Fulltext => None,
        };

        IndexEntry {
            descriptor: Index::new(field, kind, BuildState::Building),
            data,
            generation,
        }
    }

    fn kind(&self) -> IndexKind {
        self.descriptor.kind()
    }

    fn state(&self) -> &BuildState {
        self.descriptor.state()
    }

    fn set_state(&mut self, state: BuildState) {
        self.descriptor = Index::new(self.descriptor.field(), self.descriptor.kind(), state);
    }

    /// Value index data writers must keep current: building or built.
    fn live_data(&self) -> Option<&Arc<ValueIndex>> {
        if self.state().is_failed() {
            None
        } else {
            self.data.as_ref()
        }
    }

    fn is_live_text(&self) -> bool {
        self.kind() == IndexKind::Fulltext && !self.state().is_failed()
    }
}

/// Registry of the indexes of one collection and owner of their data.
///
/// Every entry is visible from the moment a build is requested. While the
/// build runs the entry is `Building`: writers already maintain its data
/// but value lookups fall back to scans until it turns `Built`. Builds on
/// the same field are serialized by a [BuildTracker]; a second build request
/// fails instead of queueing.
///
/// The collection write lock is shared with the catalog. A value index
/// build holds it for reading one chunk of documents at a time, a full-text
/// build holds it for the whole build. Writers take it exclusively and keep
/// every live index current, so a build never misses or duplicates a write.
#[derive(Clone)]
pub(crate) struct IndexCatalog {
    inner: Arc<IndexCatalogInner>,
}

impl IndexCatalog {
    pub fn new(
        collection_name: &str,
        document_map: DocumentMap,
        text_indexer: Arc<dyn TextIndexer>,
        executor: TaskExecutor,
        write_lock: Arc<RwLock<()>>,
    ) -> Self {
        IndexCatalog {
            inner: Arc::new(IndexCatalogInner {
                collection_name: collection_name.to_string(),
                entries: RwLock::new(BTreeMap::new()),
                tracker: BuildTracker::new(),
                text_indexer,
                executor,
                document_map,
                write_lock,
            }),
        }
    }

    pub fn create_index(&self, field: &str, options: &IndexOptions) -> EmberResult<()> {
        validate_field(field)?;
        let permit = {
            let mut entries = self.inner.entries.write();
            if let Some(existing) = entries.get(field) {
                if !existing.state().is_failed() {
                    log::error!(
                        "Index already exists on field {} of collection {}",
                        field,
                        self.inner.collection_name
                    );
                    return Err(EmberError::new(
                        &format!("index already exists on field {}", field),
                        ErrorKind::IndexingError,
                    ));
                }
            }

            let permit = self.inner.tracker.try_acquire(field)?;
            entries.insert(
                field.to_string(),
                IndexEntry::building(field, options.kind(), permit.generation()),
            );
            permit
        };

        log::debug!(
            "Creating {} index on field {} of collection {}",
            options.kind(),
            field,
            self.inner.collection_name
        );
        self.start_build(permit, options.kind(), options.is_async())
    }

    /// Replaces the index on `field` with a freshly built one.
    pub fn rebuild_index(&self, field: &str, is_async: bool) -> EmberResult<()> {
        let (permit, kind) = {
            let mut entries = self.inner.entries.write();
            let kind = match entries.get(field) {
                Some(entry) => entry.kind(),
                None => return Err(index_not_found(field)),
            };

            let permit = self.inner.tracker.try_acquire(field)?;
            entries.insert(
                field.to_string(),
                IndexEntry::building(field, kind, permit.generation()),
            );
            (permit, kind)
        };

        log::debug!(
            "Rebuilding {} index on field {} of collection {}",
            kind,
            field,
            self.inner.collection_name
        );
        self.start_build(permit, kind, is_async)
    }

    pub fn drop_index(&self, field: &str) -> EmberResult<()> {
        // waits for a running full-text build to finish writing
        let _guard = self.inner.write_lock.write();
        self.inner.drop_index_locked(field)
    }

    pub fn drop_all_indices(&self) -> EmberResult<()> {
        let _guard = self.inner.write_lock.write();
        let fields: Vec<String> = self.inner.entries.read().keys().cloned().collect();
        for field in fields {
            self.inner.drop_index_locked(&field)?;
        }
        Ok(())
    }

    /// Whether `field` has an index that is building or built.
    pub fn has_index(&self, field: &str) -> bool {
        self.inner
            .entries
            .read()
            .get(field)
            .map(|entry| !entry.state().is_failed())
            .unwrap_or(false)
    }

    pub fn is_indexing(&self, field: &str) -> bool {
        self.inner.tracker.is_building(field)
    }

    /// All entries, ordered by field.
    pub fn list_indices(&self) -> Vec<Index> {
        self.inner
            .entries
            .read()
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn index_status(&self, field: &str) -> Option<BuildState> {
        self.inner
            .entries
            .read()
            .get(field)
            .map(|entry| entry.state().clone())
    }

    /// The value index on `field`, only once it is fully built.
    pub fn find_value_index(&self, field: &str) -> Option<Arc<ValueIndex>> {
        let entries = self.inner.entries.read();
        entries
            .get(field)
            .filter(|entry| entry.state().is_built())
            .and_then(|entry| entry.data.clone())
    }

    /// Whether text searches on `field` can be served.
    pub fn has_text_index(&self, field: &str) -> bool {
        self.inner
            .entries
            .read()
            .get(field)
            .map(IndexEntry::is_live_text)
            .unwrap_or(false)
    }

    pub fn search_text(&self, field: &str, query: &str) -> EmberResult<BTreeSet<DocId>> {
        self.inner.text_indexer.search(field, query)
    }

    /// Indexes a document about to be stored. Must be called with the
    /// collection write lock held; nothing is indexed when a unique index
    /// rejects the document.
    pub fn on_insert(&self, id: DocId, document: &Document) -> EmberResult<()> {
        let entries = self.inner.entries.read();
        let mut additions = Vec::new();
        for (field, entry) in entries.iter() {
            if let Some(data) = entry.live_data() {
                if let Some(value) = field_value(document, field) {
                    data.check_unique(&value, id)?;
                    additions.push((data, value));
                }
            }
        }

        for (data, value) in additions {
            data.add(value, id)?;
        }

        for (field, entry) in entries.iter() {
            if entry.is_live_text() {
                self.inner.text_indexer.write(field, id, document)?;
            }
        }
        Ok(())
    }

    /// Reindexes a document about to be replaced by `new`. Must be called
    /// with the collection write lock held.
    pub fn on_update(&self, id: DocId, old: &Document, new: &Document) -> EmberResult<()> {
        let entries = self.inner.entries.read();
        let mut changes = Vec::new();
        for (field, entry) in entries.iter() {
            if let Some(data) = entry.live_data() {
                let old_value = field_value(old, field);
                let new_value = field_value(new, field);
                if old_value != new_value {
                    if let Some(value) = &new_value {
                        data.check_unique(value, id)?;
                    }
                    changes.push((data, old_value, new_value));
                }
            }
        }

        for (data, old_value, new_value) in changes {
            if let Some(value) = old_value {
                data.remove(&value, id);
            }
            if let Some(value) = new_value {
                data.add(value, id)?;
            }
        }

        for (field, entry) in entries.iter() {
            if entry.is_live_text() {
                self.inner.text_indexer.remove(field, id, old)?;
                self.inner.text_indexer.write(field, id, new)?;
            }
        }
        Ok(())
    }

    /// Unindexes a removed document. Must be called with the collection
    /// write lock held.
    pub fn on_remove(&self, id: DocId, document: &Document) -> EmberResult<()> {
        let entries = self.inner.entries.read();
        for (field, entry) in entries.iter() {
            if let Some(data) = entry.live_data() {
                if let Some(value) = field_value(document, field) {
                    data.remove(&value, id);
                }
            }
            if entry.is_live_text() {
                self.inner.text_indexer.remove(field, id, document)?;
            }
        }
        Ok(())
    }

    /// Empties every index while keeping the entries. Must be called with
    /// the collection write lock held, after the documents are cleared.
    pub fn clear_data(&self) -> EmberResult<()> {
        let entries = self.inner.entries.read();
        for (field, entry) in entries.iter() {
            if let Some(data) = entry.live_data() {
                data.clear();
            }
            if entry.kind() == IndexKind::Fulltext {
                self.inner.text_indexer.drop_index(field)?;
            }
        }
        Ok(())
    }

    fn start_build(&self, permit: BuildPermit, kind: IndexKind, is_async: bool) -> EmberResult<()> {
        let field = permit.field().to_string();
        let generation = permit.generation();

        if is_async {
            let catalog = self.clone();
            let submitted = self.inner.executor.submit(move || {
                if let Err(err) = catalog.inner.run_build(&permit, kind) {
                    log::error!(
                        "Background build of index on field {} failed: {}",
                        permit.field(),
                        err
                    );
                    catalog.inner.mark_failed(permit.field(), permit.generation(), err);
                }
            });

            if let Err(err) = submitted {
                self.inner.discard(&field, generation);
                return Err(err);
            }
            Ok(())
        } else {
            match self.inner.run_build(&permit, kind) {
                Ok(()) => Ok(()),
                Err(err) => {
                    log::error!("Build of index on field {} failed: {}", field, err);
                    self.inner.discard(&field, generation);
                    Err(err)
                }
            }
        }
    }
}

struct IndexCatalogInner {
    collection_name: String,
    entries: RwLock<BTreeMap<String, IndexEntry>>,
    tracker: BuildTracker,
    text_indexer: Arc<dyn TextIndexer>,
    executor: TaskExecutor,
    document_map: DocumentMap,
    write_lock: Arc<RwLock<()>>,
}

impl IndexCatalogInner {
    fn run_build(&self, permit: &BuildPermit, kind: IndexKind) -> EmberResult<()> {
        let field = permit.field();
        match kind {
            IndexKind::Fulltext => {
                let _guard = self.write_lock.read();
                if permit.is_cancelled() {
                    return Ok(());
                }
                let mut documents = self.document_map.entries()?;
                self.text_indexer.build(field, &mut documents)?;
            }
            IndexKind::Unique | IndexKind::NonUnique => {
                let data = {
                    let entries = self.entries.read();
                    entries
                        .get(field)
                        .filter(|entry| entry.generation == permit.generation())
                        .and_then(|entry| entry.data.clone())
                };

                match data {
                    Some(data) => {
                        if !self.populate(&data, permit)? {
                            return Ok(());
                        }
                    }
                    None => return Ok(()),
                }
            }
        }

        self.commit(permit);
        Ok(())
    }

    /// Scans the collection into `data`. Returns false if the build was
    /// cancelled midway.
    fn populate(&self, data: &ValueIndex, permit: &BuildPermit) -> EmberResult<bool> {
        let field = permit.field();
        let mut documents = self.document_map.entries()?;
        loop {
            if permit.is_cancelled() {
                log::debug!("Index build on field {} cancelled", field);
                return Ok(false);
            }

            let _guard = self.write_lock.read();
            let mut scanned = 0;
            for (id, document) in documents.by_ref().take(BUILD_CHUNK_SIZE) {
                scanned += 1;
                if let Some(value) = field_value(&document, field) {
                    data.add(value, id)?;
                }
            }

            if scanned < BUILD_CHUNK_SIZE {
                return Ok(true);
            }
        }
    }

    fn commit(&self, permit: &BuildPermit) {
        let mut entries = self.entries.write();
        match entries.get_mut(permit.field()) {
            Some(entry) if entry.generation == permit.generation() && !permit.is_cancelled() => {
                entry.set_state(BuildState::Built);
                log::debug!(
                    "Index on field {} of collection {} is built",
                    permit.field(),
                    self.collection_name
                );
            }
            _ => log::debug!(
                "Discarding superseded build of index on field {}",
                permit.field()
            ),
        }
    }

    fn mark_failed(&self, field: &str, generation: u64, cause: EmberError) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(field) {
            if entry.generation == generation {
                entry.data = None;
                entry.set_state(BuildState::Failed(cause));
                if entry.kind() == IndexKind::Fulltext {
                    self.drop_text_index(field);
                }
            }
        }
    }

    fn discard(&self, field: &str, generation: u64) {
        let mut entries = self.entries.write();
        let matches = entries
            .get(field)
            .map(|entry| entry.generation == generation)
            .unwrap_or(false);
        if matches {
            if let Some(entry) = entries.remove(field) {
                if entry.kind() == IndexKind::Fulltext {
                    self.drop_text_index(field);
                }
            }
        }
    }

    fn drop_index_locked(&self, field: &str) -> EmberResult<()> {
        let removed = self.entries.write().remove(field);
        match removed {
            Some(entry) => {
                self.tracker.cancel(field);
                if entry.kind() == IndexKind::Fulltext {
                    self.text_indexer.drop_index(field)?;
                }
                log::debug!(
                    "Dropped index on field {} of collection {}",
                    field,
                    self.collection_name
                );
                Ok(())
            }
            None => Err(index_not_found(field)),
        }
    }

    fn drop_text_index(&self, field: &str) {
        if let Err(err) = self.text_indexer.drop_index(field) {
            log::warn!("Failed to drop text index on field {}: {}", field, err);
        }
    }
}

/// The value `document` holds at `field`; unresolvable paths count as absent.
fn field_value(document: &Document, field: &str) -> Option<Value> {
    match document.get(field) {
        Ok(value) => value,
        Err(err) => {
            log::debug!("Field {} not indexable: {}", field, err);
            None
        }
    }
}

fn validate_field(field: &str) -> EmberResult<()> {
    if field.is_empty() {
        log::error!("Index field name cannot be empty");
        return Err(EmberError::new(
            "index field name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }
    if field == DOC_ID {
        log::error!("Cannot index the reserved field {}", DOC_ID);
        return Err(EmberError::new(
            &format!("cannot index the reserved field {}", DOC_ID),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

fn index_not_found(field: &str) -> EmberError {
    log::error!("No index found on field {}", field);
    EmberError::new(
        &format!("no index found on field {}", field),
        ErrorKind::IndexNotFound,
    )
}
