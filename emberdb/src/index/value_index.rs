use crate::collection::DocId;
use crate::common::{SortOrder, Value};
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::filter::ComparisonOp;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Included, Unbounded};

/// Ordered value to id-set map backing a unique or non-unique index.
///
/// Keys are whole field values in [Value] order, so `5` and `5.0` share a
/// key. Documents missing the field are not indexed. Nulls are indexed and a
/// unique index accepts any number of them.
pub(crate) struct ValueIndex {
    field: String,
    unique: bool,
    entries: RwLock<BTreeMap<Value, BTreeSet<DocId>>>,
}

impl ValueIndex {
    pub fn new(field: &str, unique: bool) -> Self {
        ValueIndex {
            field: field.to_string(),
            unique,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Fails if a unique index already maps `value` to an id other than `id`.
    pub fn check_unique(&self, value: &Value, id: DocId) -> EmberResult<()> {
        if !self.unique || value.is_null() {
            return Ok(());
        }

        let entries = self.entries.read();
        match entries.get(value) {
            Some(ids) if ids.iter().any(|existing| *existing != id) => {
                log::error!(
                    "Unique constraint violated for value {} on field {}",
                    value,
                    self.field
                );
                Err(EmberError::new(
                    &format!(
                        "unique constraint violated for value {} on field {}",
                        value, self.field
                    ),
                    ErrorKind::UniqueConstraintViolation,
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn add(&self, value: Value, id: DocId) -> EmberResult<()> {
        self.check_unique(&value, id)?;
        self.entries.write().entry(value).or_default().insert(id);
        Ok(())
    }

    pub fn remove(&self, value: &Value, id: DocId) {
        let mut entries = self.entries.write();
        if let Some(ids) = entries.get_mut(value) {
            ids.remove(&id);
            if ids.is_empty() {
                entries.remove(value);
            }
        }
    }

    pub fn find_eq(&self, value: &Value) -> BTreeSet<DocId> {
        self.entries.read().get(value).cloned().unwrap_or_default()
    }

    /// Ids whose value satisfies `op` against `value`. Only keys of the same
    /// kind as `value` are considered.
    pub fn find_range(&self, op: ComparisonOp, value: &Value) -> BTreeSet<DocId> {
        let entries = self.entries.read();
        let rank = value.kind_rank();
        let same_kind = |(key, _): &(&Value, &BTreeSet<DocId>)| key.kind_rank() == rank;

        let matched: Vec<&BTreeSet<DocId>> = match op {
            ComparisonOp::Gt => entries
                .range((Excluded(value), Unbounded))
                .take_while(same_kind)
                .map(|(_, ids)| ids)
                .collect(),
            ComparisonOp::Gte => entries
                .range((Included(value), Unbounded))
                .take_while(same_kind)
                .map(|(_, ids)| ids)
                .collect(),
            ComparisonOp::Lt => entries
                .range((Unbounded, Excluded(value)))
                .rev()
                .take_while(same_kind)
                .map(|(_, ids)| ids)
                .collect(),
            ComparisonOp::Lte => entries
                .range((Unbounded, Included(value)))
                .rev()
                .take_while(same_kind)
                .map(|(_, ids)| ids)
                .collect(),
        };

        matched.into_iter().flatten().copied().collect()
    }

    /// All indexed ids in key order. Ids sharing a key stay ascending in
    /// both directions.
    pub fn sorted_ids(&self, order: SortOrder) -> Vec<DocId> {
        let entries = self.entries.read();
        match order {
            SortOrder::Ascending => entries.values().flatten().copied().collect(),
            SortOrder::Descending => entries.values().rev().flatten().copied().collect(),
        }
    }

    /// Whether every key can serve as a sort key. Non-comparable kinds rank
    /// above all comparable ones, so checking the last key is enough.
    pub fn is_sortable(&self) -> bool {
        self.entries
            .read()
            .keys()
            .next_back()
            .map(Value::is_comparable)
            .unwrap_or(true)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(BTreeSet::len).sum()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
