use crate::collection::DocId;
use crate::common::{Value, DOC_ID};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Relational operator of a [Filter::Compare] predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    /// Whether `ordering`, the result of comparing a field value with the
    /// filter value, satisfies this operator.
    pub fn test(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Gt => ordering == Ordering::Greater,
            ComparisonOp::Gte => ordering != Ordering::Less,
            ComparisonOp::Lt => ordering == Ordering::Less,
            ComparisonOp::Lte => ordering != Ordering::Greater,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
        }
    }
}

/// A predicate over documents.
///
/// Filters form a closed tree: leaf predicates on a single field path and
/// the `And`/`Or` combinators. They are plain values; resolving one against
/// a collection happens in the collection's find operation, which chooses
/// between index lookups and a scan.
///
/// Leaf predicates never match a document in which the field is absent.
/// Comparisons only match values of the same kind as the filter value, with
/// integral and floating numbers being one kind.
///
/// ```rust,ignore
/// use emberdb::filter::{field, and};
///
/// let adults = field("age").gte(18);
/// let named = field("name").regex("^A");
/// let filter = and(vec![adults, named]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    Eq {
        field: String,
        value: Value,
    },
    Compare {
        field: String,
        op: ComparisonOp,
        value: Value,
    },
    /// Matches string values against a regular expression.
    Regex {
        field: String,
        pattern: String,
    },
    /// Full-text search. Requires a full-text index on the field.
    Text {
        field: String,
        query: String,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Combines this filter with `other` so both must match.
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            this => Filter::And(vec![this, other]),
        }
    }

    /// Combines this filter with `other` so either may match.
    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            this => Filter::Or(vec![this, other]),
        }
    }

    /// The field a leaf predicate addresses.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Filter::Eq { field, .. }
            | Filter::Compare { field, .. }
            | Filter::Regex { field, .. }
            | Filter::Text { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Filter::Text { .. })
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "All"),
            Filter::Eq { field, value } => write!(f, "({} == {})", field, value),
            Filter::Compare { field, op, value } => {
                write!(f, "({} {} {})", field, op.as_str(), value)
            }
            Filter::Regex { field, pattern } => write!(f, "({} regex {})", field, pattern),
            Filter::Text { field, query } => write!(f, "({} like {})", field, query),
            Filter::And(filters) => write_group(f, "&&", filters),
            Filter::Or(filters) => write_group(f, "||", filters),
        }
    }
}

fn write_group(f: &mut Formatter<'_>, separator: &str, filters: &[Filter]) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", separator)?;
        }
        write!(f, "{}", filter)?;
    }
    write!(f, ")")
}

/// A filter matching every document.
#[inline]
pub fn all() -> Filter {
    Filter::All
}

/// A filter matching the document with the given id.
pub fn by_id(id: DocId) -> Filter {
    Filter::Eq {
        field: DOC_ID.to_string(),
        value: Value::from(id),
    }
}

/// A filter matching documents that satisfy every filter in `filters`.
/// An empty list matches everything.
pub fn and(filters: Vec<Filter>) -> Filter {
    if filters.is_empty() {
        return Filter::All;
    }
    Filter::And(filters)
}

/// A filter matching documents that satisfy any filter in `filters`.
/// An empty list matches nothing.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}
