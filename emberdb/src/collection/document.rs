use im::OrdMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::collection::DocId;
use crate::common::{Value, DOC_ID, RESERVED_FIELDS};
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::{field_separator, FIELD_SEPARATOR};
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// An ordered mapping from field names to [Value]s, the unit of storage.
///
/// Nested documents are addressed with dot separated paths (the separator
/// is configurable when the database is opened), so `get("a.b")` reads field
/// `b` of the document stored under `a`. A numeric segment selects an array
/// element, a non-numeric segment applied to an array is resolved over every
/// element and the matches are collected into an array.
///
/// [`Document::get`] distinguishes a missing path (`Ok(None)`) from a
/// present null (`Ok(Some(Value::Null))`).
///
/// The backing map is persistent: cloning is O(1) and every mutation of a
/// clone is invisible to the original, so documents handed out by cursors
/// never alias the stored copy.
///
/// The `_id` field is reserved for the document's [DocId] and is assigned
/// on insertion.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top level fields.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, creating intermediate documents for
    /// embedded keys.
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("user.name", "Alice")?;
    /// assert_eq!(doc.get("user.name")?, Some(Value::from("Alice")));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> EmberResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EmberError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        let value = value.into();
        // a null id is a placeholder, e.g. in projection shapes
        if key == DOC_ID && !value.is_null() {
            DocId::try_from(&value)?;
        }

        if self.is_embedded(key) {
            let splits = self.split_key(key);
            self.deep_put(&splits, value)
        } else {
            self.data = self.data.update(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns the value at `key`, `None` when the path does not exist.
    ///
    /// Fails with a validation error when the path cannot exist in this
    /// document's structure: an array or byte index that is negative or out
    /// of bounds, or a numeric segment applied to a scalar.
    pub fn get(&self, key: &str) -> EmberResult<Option<Value>> {
        if let Some(value) = self.data.get(key) {
            return Ok(Some(value.clone()));
        }

        if !self.is_embedded(key) {
            return Ok(None);
        }

        let splits = self.split_key(key);
        let first = splits[0].as_str();
        if first.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EmberError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        let rest: Vec<&str> = splits[1..].iter().map(String::as_str).collect();
        recursive_get(self.data.get(first), &rest)
    }

    /// The document's id, if it has been stored.
    pub fn id(&self) -> Option<DocId> {
        self.data
            .get(DOC_ID)
            .and_then(|value| DocId::try_from(value).ok())
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    pub(crate) fn set_id(&mut self, id: DocId) {
        self.data = self.data.update(DOC_ID.to_string(), Value::from(id));
    }

    /// Removes the field at `key`. Removing a missing field is a no-op.
    pub fn remove(&mut self, key: &str) -> EmberResult<()> {
        if self.is_embedded(key) {
            let splits = self.split_key(key);
            self.deep_remove(&splits);
        } else {
            self.data = self.data.without(key);
        }
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Whether `field` resolves to a present value, at any depth.
    pub fn contains_field(&self, field: &str) -> bool {
        matches!(self.get(field), Ok(Some(_)))
    }

    /// All leaf field paths, nested documents flattened with the separator.
    /// Reserved fields are skipped.
    pub fn fields(&self) -> FieldVec {
        let separator = field_separator();
        let mut fields = FieldVec::new();
        self.collect_fields("", &separator, &mut fields);
        fields
    }

    /// Merges `other` into this document. Nested documents merge
    /// recursively, any other value overwrites.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    let mut merged = existing.clone();
                    merged.merge(incoming);
                    self.data = self.data.update(key.clone(), Value::Document(merged));
                }
                _ => {
                    self.data = self.data.update(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.data.iter()
    }

    fn is_embedded(&self, key: &str) -> bool {
        key.contains(FIELD_SEPARATOR.read().as_str())
    }

    fn split_key(&self, key: &str) -> Vec<String> {
        let separator = FIELD_SEPARATOR.read();
        key.split(separator.as_str()).map(str::to_string).collect()
    }

    fn collect_fields(&self, prefix: &str, separator: &str, fields: &mut FieldVec) {
        for (key, value) in self.data.iter() {
            if key.is_empty() || (prefix.is_empty() && RESERVED_FIELDS.contains(&key.as_str())) {
                continue;
            }

            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, separator, key)
            };

            match value {
                Value::Document(nested) if !nested.is_empty() => {
                    nested.collect_fields(&field, separator, fields)
                }
                _ => fields.push(field),
            }
        }
    }

    fn deep_put(&mut self, splits: &[String], value: Value) -> EmberResult<()> {
        let key = &splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty embedded key");
            return Err(EmberError::new(
                "Document does not support empty embedded key",
                ErrorKind::ValidationError,
            ));
        }

        if splits.len() == 1 {
            self.data = self.data.update(key.clone(), value);
            return Ok(());
        }

        let mut nested = match self.data.get(key) {
            Some(Value::Document(existing)) => existing.clone(),
            _ => Document::new(),
        };
        nested.deep_put(&splits[1..], value)?;
        self.data = self.data.update(key.clone(), Value::Document(nested));
        Ok(())
    }

    fn deep_remove(&mut self, splits: &[String]) {
        let key = &splits[0];
        if splits.len() == 1 {
            self.data = self.data.without(key);
            return;
        }

        if let Some(Value::Document(existing)) = self.data.get(key) {
            let mut nested = existing.clone();
            nested.deep_remove(&splits[1..]);
            self.data = self.data.update(key.clone(), Value::Document(nested));
        }
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let fields = self
            .data
            .iter()
            .map(|(key, value)| {
                format!("{}\"{}\": {}", indent_str, key, value.to_pretty_json(indent + 2))
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", fields, " ".repeat(indent))
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        let fields = self
            .data
            .iter()
            .map(|(key, value)| format!("\"{}\": {}", key, value.to_debug_string(indent + 2)))
            .join(", ");
        format!("{{{}}}", fields)
    }
}

fn parse_index(key: &str) -> Option<isize> {
    key.parse::<isize>().ok()
}

fn checked_index(index: isize, len: usize, kind: &str) -> EmberResult<usize> {
    if index < 0 || index as usize >= len {
        log::warn!("Index {} out of bounds for {} of length {}", index, kind, len);
        return Err(EmberError::new(
            &format!("index {} out of bounds for {} of length {}", index, kind, len),
            ErrorKind::ValidationError,
        ));
    }
    Ok(index as usize)
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> EmberResult<Option<Value>> {
    let value = match value {
        None => return Ok(None),
        Some(v) => v,
    };

    if splits.is_empty() {
        return Ok(Some(value.clone()));
    }

    let key = splits[0];
    if key.is_empty() {
        log::error!("Document does not support empty embedded key");
        return Err(EmberError::new(
            "Document does not support empty embedded key",
            ErrorKind::ValidationError,
        ));
    }

    match value {
        Value::Document(obj) => recursive_get(obj.data.get(key), &splits[1..]),
        Value::Array(arr) => match parse_index(key) {
            Some(index) => {
                let index = checked_index(index, arr.len(), "array")?;
                recursive_get(Some(&arr[index]), &splits[1..])
            }
            None => decompose(arr, splits),
        },
        Value::Bytes(bytes) => match parse_index(key) {
            Some(index) => {
                let index = checked_index(index, bytes.len(), "byte sequence")?;
                let byte = Value::from(bytes[index]);
                recursive_get(Some(&byte), &splits[1..])
            }
            None => Ok(None),
        },
        Value::Null => Ok(None),
        scalar => match parse_index(key) {
            Some(index) => {
                log::warn!("Cannot index {} into a {} value", index, scalar.kind_name());
                Err(EmberError::new(
                    &format!("cannot index {} into a {} value", index, scalar.kind_name()),
                    ErrorKind::ValidationError,
                ))
            }
            None => Ok(None),
        },
    }
}

fn decompose(arr: &[Value], splits: &[&str]) -> EmberResult<Option<Value>> {
    let mut items: Vec<Value> = Vec::with_capacity(arr.len());
    for item in arr {
        match recursive_get(Some(item), splits)? {
            Some(Value::Array(nested)) => items.extend(nested),
            Some(value) => items.push(value),
            None => {}
        }
    }

    if items.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Array(items.into_iter().unique().collect())))
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use emberdb::doc;
///
/// let doc = doc! {
///     name: "Alice",
///     score: (40 + 2),
///     address: { city: "Paris" },
///     tags: ["a", "b"]
/// };
/// assert_eq!(doc.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
