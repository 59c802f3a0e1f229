use crate::collection::operation::{FilterResolver, IndexCatalog};
use crate::collection::{DocId, Document};
use crate::common::DOC_ID;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::filter::Filter;
use crate::store::DocumentMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Mutations of one collection. Writers are serialized by the collection
/// write lock, and every write keeps the live indexes current before the
/// document map changes.
///
/// Multi-document writes are not atomic: a write rejected midway, e.g. by a
/// unique index, leaves the documents processed before it in place.
pub(crate) struct WriteOperations {
    collection_name: String,
    catalog: IndexCatalog,
    document_map: DocumentMap,
    write_lock: Arc<RwLock<()>>,
}

impl WriteOperations {
    pub fn new(
        collection_name: &str,
        catalog: IndexCatalog,
        document_map: DocumentMap,
        write_lock: Arc<RwLock<()>>,
    ) -> Self {
        WriteOperations {
            collection_name: collection_name.to_string(),
            catalog,
            document_map,
            write_lock,
        }
    }

    pub fn insert(&self, document: Document) -> EmberResult<DocId> {
        let _guard = self.write_lock.write();
        self.insert_unlocked(document)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> EmberResult<Vec<DocId>> {
        let _guard = self.write_lock.write();
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(self.insert_unlocked(document)?);
        }
        Ok(ids)
    }

    /// Merges `update` into every document matching `filter`. Returns the
    /// number of documents changed.
    pub fn update(&self, filter: &Filter, update: &Document) -> EmberResult<usize> {
        validate_update(update)?;
        let _guard = self.write_lock.write();
        let ids = FilterResolver::new(&self.catalog, &self.document_map, filter)?.resolve(filter)?;

        let mut count = 0;
        for id in ids {
            if self.update_unlocked(id, update)? {
                count += 1;
            }
        }
        log::debug!("Updated {} documents in {}", count, self.collection_name);
        Ok(count)
    }

    pub fn update_by_id(&self, id: DocId, update: &Document) -> EmberResult<bool> {
        validate_update(update)?;
        let _guard = self.write_lock.write();
        self.update_unlocked(id, update)
    }

    /// Removes every document matching `filter`. Returns the number removed.
    pub fn remove(&self, filter: &Filter) -> EmberResult<usize> {
        let _guard = self.write_lock.write();
        let ids = FilterResolver::new(&self.catalog, &self.document_map, filter)?.resolve(filter)?;

        let mut count = 0;
        for id in ids {
            if let Some(document) = self.document_map.remove(&id)? {
                self.catalog.on_remove(id, &document)?;
                count += 1;
            }
        }
        log::debug!("Removed {} documents from {}", count, self.collection_name);
        Ok(count)
    }

    pub fn clear(&self) -> EmberResult<()> {
        let _guard = self.write_lock.write();
        self.document_map.clear()?;
        self.catalog.clear_data()
    }

    fn insert_unlocked(&self, mut document: Document) -> EmberResult<DocId> {
        if let Some(value) = document.get(DOC_ID)? {
            if !value.is_null() {
                log::error!(
                    "Document inserted into {} already carries {} {}",
                    self.collection_name,
                    DOC_ID,
                    value
                );
                return Err(EmberError::new(
                    &format!("document cannot be inserted with a preset {} {}", DOC_ID, value),
                    ErrorKind::InvalidId,
                ));
            }
        }

        let id = DocId::new_unique();
        document.set_id(id);
        self.catalog.on_insert(id, &document)?;
        self.document_map.put(id, document)?;
        Ok(id)
    }

    fn update_unlocked(&self, id: DocId, update: &Document) -> EmberResult<bool> {
        let old = match self.document_map.get(&id)? {
            Some(document) => document,
            None => return Ok(false),
        };

        let mut new = old.clone();
        new.merge(update);
        if new == old {
            return Ok(false);
        }

        self.catalog.on_update(id, &old, &new)?;
        self.document_map.put(id, new)?;
        Ok(true)
    }
}

fn validate_update(update: &Document) -> EmberResult<()> {
    if update.contains_key(DOC_ID) {
        log::error!("Update document cannot change {}", DOC_ID);
        return Err(EmberError::new(
            &format!("update document cannot change {}", DOC_ID),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}
