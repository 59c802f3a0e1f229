use crate::common::Value;
use crate::filter::{ComparisonOp, Filter};

/// Starts a filter on `field_name`, a dot separated path.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// Builder for the leaf predicates on one field.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    /// Field equals `value`. Numbers are compared by value, so `eq(5)`
    /// matches a stored `5.0`.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Eq {
            field: self.field_name,
            value: value.into(),
        }
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Gt, value.into())
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Gte, value.into())
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Lt, value.into())
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Lte, value.into())
    }

    /// Field lies in the inclusive range `[lower, upper]`.
    pub fn between<T: Into<Value>, U: Into<Value>>(self, lower: T, upper: U) -> Filter {
        Filter::And(vec![
            self.clone_field().compare(ComparisonOp::Gte, lower.into()),
            self.compare(ComparisonOp::Lte, upper.into()),
        ])
    }

    /// Field equals any of `values`.
    pub fn in_values<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::Or(
            values
                .into_iter()
                .map(|value| self.clone_field().eq(value))
                .collect(),
        )
    }

    /// String field matches the regular expression `pattern`. The pattern
    /// is compiled when the filter is resolved.
    #[inline]
    pub fn regex(self, pattern: &str) -> Filter {
        Filter::Regex {
            field: self.field_name,
            pattern: pattern.to_string(),
        }
    }

    /// Full-text search on a field carrying a full-text index.
    #[inline]
    pub fn text(self, query: &str) -> Filter {
        Filter::Text {
            field: self.field_name,
            query: query.to_string(),
        }
    }

    fn compare(self, op: ComparisonOp, value: Value) -> Filter {
        Filter::Compare {
            field: self.field_name,
            op,
            value,
        }
    }

    fn clone_field(&self) -> FluentFilter {
        FluentFilter {
            field_name: self.field_name.clone(),
        }
    }
}
