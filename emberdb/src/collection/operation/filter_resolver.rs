use crate::collection::operation::IndexCatalog;
use crate::collection::{DocId, Document};
use crate::common::{Value, DOC_ID};
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::filter::Filter;
use crate::store::DocumentMap;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// Turns a [Filter] into the set of matching ids.
///
/// The filter is validated up front: empty field names, invalid regular
/// expressions and text searches on fields without a full-text index all
/// fail before any document is read. Equality and comparison predicates on
/// fields with a built value index are answered from the index; `_id`
/// equality is a point lookup; everything else is evaluated by scanning
/// documents. `And` resolves its indexed children first and scans only the
/// ids they leave.
pub(crate) struct FilterResolver<'a> {
    catalog: &'a IndexCatalog,
    document_map: &'a DocumentMap,
    patterns: HashMap<String, Regex>,
}

impl<'a> FilterResolver<'a> {
    pub fn new(
        catalog: &'a IndexCatalog,
        document_map: &'a DocumentMap,
        filter: &Filter,
    ) -> EmberResult<Self> {
        let mut resolver = FilterResolver {
            catalog,
            document_map,
            patterns: HashMap::new(),
        };
        resolver.prepare(filter)?;
        Ok(resolver)
    }

    pub fn resolve(&self, filter: &Filter) -> EmberResult<BTreeSet<DocId>> {
        self.resolve_within(filter, None)
    }

    fn prepare(&mut self, filter: &Filter) -> EmberResult<()> {
        if let Some(field) = filter.field_name() {
            if field.is_empty() {
                log::error!("Filter field name cannot be empty in {}", filter);
                return Err(EmberError::new(
                    "filter field name cannot be empty",
                    ErrorKind::FilterError,
                ));
            }
        }

        match filter {
            Filter::Regex { pattern, .. } => {
                if !self.patterns.contains_key(pattern) {
                    let regex = Regex::new(pattern).inspect_err(|err| {
                        log::error!("Invalid regex pattern {}: {}", pattern, err)
                    })?;
                    self.patterns.insert(pattern.clone(), regex);
                }
            }
            Filter::Text { field, .. } => {
                if !self.catalog.has_text_index(field) {
                    log::error!("Text filter on field {} requires a full-text index", field);
                    return Err(EmberError::new(
                        &format!("field {} has no full-text index", field),
                        ErrorKind::FilterError,
                    ));
                }
            }
            Filter::And(filters) | Filter::Or(filters) => {
                for child in filters {
                    self.prepare(child)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn resolve_within(
        &self,
        filter: &Filter,
        candidates: Option<&BTreeSet<DocId>>,
    ) -> EmberResult<BTreeSet<DocId>> {
        if filter.is_all() {
            return match candidates {
                Some(candidates) => Ok(candidates.clone()),
                None => Ok(self.document_map.ids()?.collect()),
            };
        }

        if !self.uses_index(filter) {
            log::debug!("Resolving {} by scan", filter);
            return self.scan(&[filter], candidates);
        }

        let ids = match filter {
            Filter::Eq { field, value } if field == DOC_ID => self.lookup_id(value)?,
            Filter::Eq { field, value } => match self.catalog.find_value_index(field) {
                Some(index) => index.find_eq(value),
                None => BTreeSet::new(),
            },
            Filter::Compare { field, op, value } => match self.catalog.find_value_index(field) {
                Some(index) => index.find_range(*op, value),
                None => BTreeSet::new(),
            },
            Filter::Text { field, query } => self.catalog.search_text(field, query)?,
            Filter::And(filters) => return self.resolve_and(filters, candidates),
            Filter::Or(filters) => return self.resolve_or(filters, candidates),
            _ => return self.scan(&[filter], candidates),
        };

        log::debug!("Resolved {} from index", filter);
        Ok(narrow(ids, candidates))
    }

    fn resolve_and(
        &self,
        filters: &[Filter],
        candidates: Option<&BTreeSet<DocId>>,
    ) -> EmberResult<BTreeSet<DocId>> {
        let (indexed, scanned): (Vec<&Filter>, Vec<&Filter>) =
            filters.iter().partition(|child| self.uses_index(child));

        let mut current = candidates.cloned();
        for child in indexed {
            let ids = self.resolve_within(child, current.as_ref())?;
            if ids.is_empty() {
                return Ok(ids);
            }
            current = Some(ids);
        }

        if scanned.is_empty() {
            return match current {
                Some(ids) => Ok(ids),
                None => Ok(self.document_map.ids()?.collect()),
            };
        }
        self.scan(&scanned, current.as_ref())
    }

    fn resolve_or(
        &self,
        filters: &[Filter],
        candidates: Option<&BTreeSet<DocId>>,
    ) -> EmberResult<BTreeSet<DocId>> {
        if filters.iter().any(Filter::is_all) {
            return self.resolve_within(&Filter::All, candidates);
        }

        let mut ids = BTreeSet::new();
        for child in filters {
            ids.extend(self.resolve_within(child, candidates)?);
        }
        Ok(ids)
    }

    /// Ids equal to `value`. Integers are a point lookup. A float is
    /// compared against every id, since ids above 2^53 share float values.
    fn lookup_id(&self, value: &Value) -> EmberResult<BTreeSet<DocId>> {
        match value {
            Value::Int(_) => {
                let mut ids = BTreeSet::new();
                if let Ok(id) = DocId::try_from(value) {
                    if self.document_map.contains_key(&id)? {
                        ids.insert(id);
                    }
                }
                Ok(ids)
            }
            Value::Float(_) => Ok(self
                .document_map
                .ids()?
                .filter(|id| Value::from(*id) == *value)
                .collect()),
            _ => Ok(BTreeSet::new()),
        }
    }

    /// Whether resolving `filter` touches an index.
    fn uses_index(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Eq { field, .. } if field == DOC_ID => true,
            Filter::Eq { field, .. } | Filter::Compare { field, .. } => {
                self.catalog.find_value_index(field).is_some()
            }
            Filter::Text { .. } => true,
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().any(|child| self.uses_index(child))
            }
            _ => false,
        }
    }

    /// Ids of documents matching every filter in `filters`, drawn from
    /// `candidates` or from the whole collection.
    fn scan(
        &self,
        filters: &[&Filter],
        candidates: Option<&BTreeSet<DocId>>,
    ) -> EmberResult<BTreeSet<DocId>> {
        let mut ids = BTreeSet::new();
        match candidates {
            Some(candidates) => {
                for id in candidates {
                    if let Some(document) = self.document_map.get(id)? {
                        if self.matches_all(filters, *id, &document)? {
                            ids.insert(*id);
                        }
                    }
                }
            }
            None => {
                for (id, document) in self.document_map.entries()? {
                    if self.matches_all(filters, id, &document)? {
                        ids.insert(id);
                    }
                }
            }
        }
        Ok(ids)
    }

    fn matches_all(&self, filters: &[&Filter], id: DocId, document: &Document) -> EmberResult<bool> {
        for filter in filters {
            if !self.matches(filter, id, document)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluates `filter` against one document.
    pub fn matches(&self, filter: &Filter, id: DocId, document: &Document) -> EmberResult<bool> {
        match filter {
            Filter::All => Ok(true),
            Filter::Eq { field, value } => {
                Ok(matches!(field_value(document, field)?, Some(found) if found == *value))
            }
            Filter::Compare { field, op, value } => match field_value(document, field)? {
                Some(found) if found.kind_rank() == value.kind_rank() => {
                    Ok(op.test(found.cmp(value)))
                }
                _ => Ok(false),
            },
            Filter::Regex { field, pattern } => match field_value(document, field)? {
                Some(Value::String(text)) => match self.patterns.get(pattern) {
                    Some(regex) => Ok(regex.is_match(&text)),
                    None => Ok(Regex::new(pattern)?.is_match(&text)),
                },
                None | Some(Value::Null) => Ok(false),
                Some(other) => {
                    log::error!(
                        "Regex filter on field {} found non-string value {}",
                        field,
                        other
                    );
                    Err(EmberError::new(
                        &format!(
                            "regex filter on field {} cannot match a {} value",
                            field,
                            other.kind_name()
                        ),
                        ErrorKind::FilterError,
                    ))
                }
            },
            Filter::Text { field, query } => {
                Ok(self.catalog.search_text(field, query)?.contains(&id))
            }
            Filter::And(filters) => {
                for child in filters {
                    if !self.matches(child, id, document)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(filters) => {
                for child in filters {
                    if self.matches(child, id, document)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn field_value(document: &Document, field: &str) -> EmberResult<Option<Value>> {
    document.get(field).map_err(|err| {
        log::error!("Cannot resolve field {} in filter: {}", field, err);
        EmberError::new_with_cause(
            &format!("cannot resolve field {}", field),
            ErrorKind::FilterError,
            err,
        )
    })
}

fn narrow(ids: BTreeSet<DocId>, candidates: Option<&BTreeSet<DocId>>) -> BTreeSet<DocId> {
    match candidates {
        Some(candidates) => ids.intersection(candidates).copied().collect(),
        None => ids,
    }
}
