use crate::collection::{DocId, Document};
use crate::common::Value;
use crate::errors::EmberResult;
use crate::index::text::{TextIndexer, Tokenizer};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Included, Unbounded};
use std::sync::Arc;

type Postings = BTreeMap<String, BTreeSet<DocId>>;

/// In-memory inverted index, one posting map per field.
///
/// String values and arrays of strings are tokenized. Other values are
/// ignored. A query is split on whitespace and the terms are OR-ed. A term
/// may carry a leading and/or trailing `*` to match tokens by suffix, prefix
/// or substring.
#[derive(Clone, Default)]
pub struct InMemoryTextIndexer {
    fields: Arc<DashMap<String, Arc<RwLock<Postings>>>>,
    tokenizer: Tokenizer,
}

impl InMemoryTextIndexer {
    pub fn new() -> Self {
        InMemoryTextIndexer::default()
    }

    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        InMemoryTextIndexer {
            fields: Arc::new(DashMap::new()),
            tokenizer,
        }
    }

    fn tokens(&self, field: &str, document: &Document) -> Vec<String> {
        match document.get(field) {
            Ok(Some(Value::String(text))) => self.tokenizer.tokenize(&text),
            Ok(Some(Value::Array(items))) => items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(|text| self.tokenizer.tokenize(text))
                .collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                log::debug!("Skipping text indexing of field {}: {}", field, err);
                Vec::new()
            }
        }
    }

    fn postings(&self, field: &str) -> Arc<RwLock<Postings>> {
        self.fields.entry(field.to_string()).or_default().clone()
    }

    fn match_term(postings: &Postings, term: &str, ids: &mut BTreeSet<DocId>) {
        let leading = term.starts_with('*');
        let trailing = term.len() > 1 && term.ends_with('*');
        let core = term.trim_matches('*').to_lowercase();
        if core.is_empty() {
            return;
        }

        match (leading, trailing) {
            (false, false) => {
                if let Some(found) = postings.get(&core) {
                    ids.extend(found.iter().copied());
                }
            }
            (false, true) => {
                for (_, found) in postings
                    .range::<str, _>((Included(core.as_str()), Unbounded))
                    .take_while(|(token, _)| token.starts_with(core.as_str()))
                {
                    ids.extend(found.iter().copied());
                }
            }
            (true, false) => {
                for (_, found) in postings.iter().filter(|(token, _)| token.ends_with(core.as_str())) {
                    ids.extend(found.iter().copied());
                }
            }
            (true, true) => {
                for (_, found) in postings.iter().filter(|(token, _)| token.contains(core.as_str())) {
                    ids.extend(found.iter().copied());
                }
            }
        }
    }
}

impl TextIndexer for InMemoryTextIndexer {
    fn build(
        &self,
        field: &str,
        documents: &mut dyn Iterator<Item = (DocId, Document)>,
    ) -> EmberResult<()> {
        let mut postings = Postings::new();
        for (id, document) in documents {
            for token in self.tokens(field, &document) {
                postings.entry(token).or_default().insert(id);
            }
        }
        log::debug!("Built text index on {} with {} terms", field, postings.len());
        self.fields
            .insert(field.to_string(), Arc::new(RwLock::new(postings)));
        Ok(())
    }

    fn write(&self, field: &str, id: DocId, document: &Document) -> EmberResult<()> {
        let tokens = self.tokens(field, document);
        if tokens.is_empty() {
            return Ok(());
        }

        let postings = self.postings(field);
        let mut postings = postings.write();
        for token in tokens {
            postings.entry(token).or_default().insert(id);
        }
        Ok(())
    }

    fn remove(&self, field: &str, id: DocId, document: &Document) -> EmberResult<()> {
        let postings = match self.fields.get(field) {
            Some(postings) => postings.clone(),
            None => return Ok(()),
        };

        let mut postings = postings.write();
        for token in self.tokens(field, document) {
            if let Some(ids) = postings.get_mut(&token) {
                ids.remove(&id);
                if ids.is_empty() {
                    postings.remove(&token);
                }
            }
        }
        Ok(())
    }

    fn search(&self, field: &str, query: &str) -> EmberResult<BTreeSet<DocId>> {
        let mut ids = BTreeSet::new();
        let postings = match self.fields.get(field) {
            Some(postings) => postings.clone(),
            None => return Ok(ids),
        };

        let postings = postings.read();
        for term in query.split_whitespace() {
            if term.contains('*') {
                Self::match_term(&postings, term, &mut ids);
            } else {
                for token in self.tokenizer.tokenize(term) {
                    Self::match_term(&postings, &token, &mut ids);
                }
            }
        }
        Ok(ids)
    }

    fn drop_index(&self, field: &str) -> EmberResult<()> {
        self.fields.remove(field);
        Ok(())
    }
}
