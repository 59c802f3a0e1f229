use crate::collection::DocId;
use crate::common::SortOrder;
use crate::store::DocumentMap;

/// Pagination and ordering of a find operation.
///
/// `skip` and `limit` are signed so that negative values supplied by a
/// caller can be reported as validation errors instead of wrapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) skip: Option<i64>,
    pub(crate) limit: Option<i64>,
    pub(crate) sort_by: Vec<(String, SortOrder)>,
}

pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().then_order_by(field_name, sort_order)
}

pub fn skip_by(skip: i64) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: i64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn skip(mut self, skip: i64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key. Earlier keys take precedence.
    pub fn then_order_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn skip_value(&self) -> Option<i64> {
        self.skip
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn sort_by(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }
}

/// The resolved outcome of one query: the page of ids in result order and
/// the metadata of the full result. Immutable once built.
pub(crate) struct FindResult {
    pub(crate) ids: Vec<DocId>,
    pub(crate) has_more: bool,
    pub(crate) total_count: usize,
    pub(crate) document_map: DocumentMap,
}
