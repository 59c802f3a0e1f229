use crate::collection::operation::{FilterResolver, IndexCatalog};
use crate::collection::{DocId, FindOptions, FindResult};
use crate::common::{SortOrder, Value};
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::filter::Filter;
use crate::store::DocumentMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub(crate) struct ReadOperations {
    catalog: IndexCatalog,
    document_map: DocumentMap,
}

impl ReadOperations {
    pub fn new(catalog: IndexCatalog, document_map: DocumentMap) -> Self {
        ReadOperations {
            catalog,
            document_map,
        }
    }

    pub fn find(&self, filter: &Filter, options: &FindOptions) -> EmberResult<FindResult> {
        let (skip, limit) = validate_window(options)?;
        let resolver = FilterResolver::new(&self.catalog, &self.document_map, filter)?;

        let ordered = match self.index_order(filter, options) {
            Some(ids) => ids,
            None => {
                let ids = resolver.resolve(filter)?;
                if options.sort_by.is_empty() {
                    ids.into_iter().collect()
                } else {
                    self.sort(ids, &options.sort_by)?
                }
            }
        };

        paginate(ordered, skip, limit, self.document_map.clone())
    }

    /// The full collection in the order of a single sort field, read from a
    /// built value index when one exists.
    fn index_order(&self, filter: &Filter, options: &FindOptions) -> Option<Vec<DocId>> {
        if !filter.is_all() || options.sort_by.len() != 1 {
            return None;
        }

        let (field, order) = &options.sort_by[0];
        let index = self.catalog.find_value_index(field)?;
        if !index.is_sortable() {
            return None;
        }

        let indexed = index.sorted_ids(*order);
        let indexed_set: BTreeSet<DocId> = indexed.iter().copied().collect();
        let unindexed: Vec<DocId> = match self.document_map.ids() {
            Ok(ids) => ids.filter(|id| !indexed_set.contains(id)).collect(),
            Err(err) => {
                log::warn!("Falling back to sorting by scan: {}", err);
                return None;
            }
        };

        log::debug!("Sorting by index on field {}", field);
        let ids = match order {
            SortOrder::Ascending => unindexed.into_iter().chain(indexed).collect(),
            SortOrder::Descending => indexed.into_iter().chain(unindexed).collect(),
        };
        Some(ids)
    }

    /// Sorts `ids` by the document values of the sort fields. Documents
    /// removed since resolution are dropped.
    fn sort(
        &self,
        ids: BTreeSet<DocId>,
        sort_by: &[(String, SortOrder)],
    ) -> EmberResult<Vec<DocId>> {
        let mut keyed: Vec<(DocId, Vec<Option<Value>>)> = Vec::with_capacity(ids.len());
        for id in ids {
            let document = match self.document_map.get(&id)? {
                Some(document) => document,
                None => continue,
            };

            let mut keys = Vec::with_capacity(sort_by.len());
            for (field, _) in sort_by {
                let key = document.get(field).map_err(|err| {
                    log::error!("Cannot read sort field {}: {}", field, err);
                    EmberError::new_with_cause(
                        &format!("cannot read sort field {}", field),
                        ErrorKind::InvalidOperation,
                        err,
                    )
                })?;
                if let Some(value) = &key {
                    if !value.is_comparable() {
                        log::error!(
                            "Cannot sort on field {} holding a {} value",
                            field,
                            value.kind_name()
                        );
                        return Err(EmberError::new(
                            &format!(
                                "cannot sort on field {} holding a {} value",
                                field,
                                value.kind_name()
                            ),
                            ErrorKind::InvalidOperation,
                        ));
                    }
                }
                keys.push(key);
            }
            keyed.push((id, keys));
        }

        // stable: ids are ascending, so ties stay in id order
        keyed.sort_by(|(_, left), (_, right)| compare_keys(left, right, sort_by));
        Ok(keyed.into_iter().map(|(id, _)| id).collect())
    }
}

/// Absent sorts before null, null before every value.
fn compare_keys(
    left: &[Option<Value>],
    right: &[Option<Value>],
    sort_by: &[(String, SortOrder)],
) -> Ordering {
    for ((l, r), (_, order)) in left.iter().zip(right.iter()).zip(sort_by) {
        let ordering = match order {
            SortOrder::Ascending => l.cmp(r),
            SortOrder::Descending => r.cmp(l),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn validate_window(options: &FindOptions) -> EmberResult<(usize, Option<usize>)> {
    let skip = match options.skip {
        Some(skip) if skip < 0 => return Err(invalid_window("skip", skip)),
        Some(skip) => skip as usize,
        None => 0,
    };
    let limit = match options.limit {
        Some(limit) if limit < 0 => return Err(invalid_window("limit", limit)),
        Some(limit) => Some(limit as usize),
        None => None,
    };
    Ok((skip, limit))
}

fn invalid_window(name: &str, value: i64) -> EmberError {
    log::warn!("Find option {} cannot be negative, got {}", name, value);
    EmberError::new(
        &format!("{} cannot be negative, got {}", name, value),
        ErrorKind::ValidationError,
    )
}

fn paginate(
    ordered: Vec<DocId>,
    skip: usize,
    limit: Option<usize>,
    document_map: DocumentMap,
) -> EmberResult<FindResult> {
    let total_count = ordered.len();
    if skip > total_count {
        log::warn!("Skip {} exceeds the result count {}", skip, total_count);
        return Err(EmberError::new(
            &format!("skip {} exceeds the result count {}", skip, total_count),
            ErrorKind::ValidationError,
        ));
    }

    let end = match limit {
        Some(limit) => skip.saturating_add(limit).min(total_count),
        None => total_count,
    };
    let has_more = match limit {
        Some(limit) => skip.saturating_add(limit) < total_count,
        None => false,
    };

    Ok(FindResult {
        ids: ordered[skip..end].to_vec(),
        has_more,
        total_count,
        document_map,
    })
}
