use crate::collection::{DocId, Document};
use crate::errors::EmberResult;
use crate::store::{EntryIterator, MapProvider};
use crossbeam_skiplist::SkipMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

/// In-memory [MapProvider] over a concurrent skip list.
///
/// Point operations are O(log n) and lock free. Iterators hold only the
/// last id they returned and seek past it on every step, so they never pin
/// the map and observe concurrent writes made ahead of their position.
#[derive(Clone, Default)]
pub struct InMemoryMap {
    inner: Arc<SkipMap<DocId, Document>>,
}

impl InMemoryMap {
    pub fn new() -> Self {
        InMemoryMap {
            inner: Arc::new(SkipMap::new()),
        }
    }
}

impl MapProvider for InMemoryMap {
    fn contains_key(&self, id: &DocId) -> EmberResult<bool> {
        Ok(self.inner.contains_key(id))
    }

    fn get(&self, id: &DocId) -> EmberResult<Option<Document>> {
        Ok(self.inner.get(id).map(|entry| entry.value().clone()))
    }

    fn put(&self, id: DocId, document: Document) -> EmberResult<()> {
        self.inner.insert(id, document);
        Ok(())
    }

    fn remove(&self, id: &DocId) -> EmberResult<Option<Document>> {
        Ok(self.inner.remove(id).map(|entry| entry.value().clone()))
    }

    fn size(&self) -> EmberResult<usize> {
        Ok(self.inner.len())
    }

    fn entries(&self) -> EmberResult<EntryIterator> {
        Ok(Box::new(SkipMapEntries {
            map: self.inner.clone(),
            last: None,
        }))
    }

    fn clear(&self) -> EmberResult<()> {
        self.inner.clear();
        Ok(())
    }
}

struct SkipMapEntries {
    map: Arc<SkipMap<DocId, Document>>,
    last: Option<DocId>,
}

impl Iterator for SkipMapEntries {
    type Item = (DocId, Document);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match &self.last {
            None => self.map.front(),
            Some(last) => self.map.range((Excluded(*last), Unbounded)).next(),
        }?;
        let id = *entry.key();
        self.last = Some(id);
        Some((id, entry.value().clone()))
    }
}
