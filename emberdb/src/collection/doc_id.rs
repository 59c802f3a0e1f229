use crate::common::Value;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use crate::ID_GENERATOR;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Primary key of a stored document.
///
/// Ids are allocated by a process wide snowflake generator, so their
/// natural order follows creation order. They are stored in a document's
/// `_id` field as a positive integer.
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocId {
    id_value: u64,
}

impl DocId {
    /// Allocates a fresh id.
    pub fn new_unique() -> Self {
        DocId {
            id_value: ID_GENERATOR.get_id(),
        }
    }

    /// Wraps an existing id value. Zero and values above `i64::MAX` are invalid.
    pub fn create_id(id_value: u64) -> EmberResult<DocId> {
        if id_value == 0 || id_value > i64::MAX as u64 {
            log::error!("Invalid document id value {}", id_value);
            return Err(EmberError::new(
                &format!("invalid document id value {}", id_value),
                ErrorKind::InvalidId,
            ));
        }
        Ok(DocId { id_value })
    }

    pub fn id_value(&self) -> u64 {
        self.id_value
    }
}

impl Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_value)
    }
}

impl Debug for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocId({})", self.id_value)
    }
}

impl FromStr for DocId {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id_value = s.parse::<u64>()?;
        DocId::create_id(id_value)
    }
}

impl From<DocId> for Value {
    fn from(id: DocId) -> Self {
        Value::Int(id.id_value as i64)
    }
}

impl TryFrom<&Value> for DocId {
    type Error = EmberError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(v) if *v > 0 => DocId::create_id(*v as u64),
            other => {
                log::error!("Value {} is not a valid document id", other);
                Err(EmberError::new(
                    &format!("value {} is not a valid document id", other),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }
}
