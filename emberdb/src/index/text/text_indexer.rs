use crate::collection::{DocId, Document};
use crate::errors::{EmberError, EmberResult, ErrorKind};
use std::collections::BTreeSet;

/// Full-text indexing service consulted for text filters.
///
/// The catalog tracks which fields carry a full-text index and their build
/// state. The indexer owns the token data. Each collection gets its own
/// indexer instance.
pub trait TextIndexer: Send + Sync {
    /// Replaces the index for `field` with one built from `documents`.
    fn build(
        &self,
        field: &str,
        documents: &mut dyn Iterator<Item = (DocId, Document)>,
    ) -> EmberResult<()>;

    /// Indexes one stored document.
    fn write(&self, field: &str, id: DocId, document: &Document) -> EmberResult<()>;

    /// Removes one document's tokens; `document` is the stored version.
    fn remove(&self, field: &str, id: DocId, document: &Document) -> EmberResult<()>;

    /// Ids of documents matching `query` on `field`, in id order.
    fn search(&self, field: &str, query: &str) -> EmberResult<BTreeSet<DocId>>;

    fn drop_index(&self, field: &str) -> EmberResult<()>;
}

/// Default indexer. It accepts index maintenance and fails every search.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpTextIndexer;

impl TextIndexer for NoOpTextIndexer {
    fn build(
        &self,
        _field: &str,
        _documents: &mut dyn Iterator<Item = (DocId, Document)>,
    ) -> EmberResult<()> {
        Ok(())
    }

    fn write(&self, _field: &str, _id: DocId, _document: &Document) -> EmberResult<()> {
        Ok(())
    }

    fn remove(&self, _field: &str, _id: DocId, _document: &Document) -> EmberResult<()> {
        Ok(())
    }

    fn search(&self, field: &str, _query: &str) -> EmberResult<BTreeSet<DocId>> {
        log::error!("No full-text indexer configured to search field {}", field);
        Err(EmberError::new(
            &format!("no full-text indexer configured to search field {}", field),
            ErrorKind::FilterError,
        ))
    }

    fn drop_index(&self, _field: &str) -> EmberResult<()> {
        Ok(())
    }
}
