//! Collections and documents.
//!
//! A [`Document`] is an ordered map from field names to [`Value`]s with
//! dot separated access to nested fields. A [`Collection`] stores documents
//! under [`DocId`]s, maintains their indexes and answers queries.
//!
//! ```rust,ignore
//! use emberdb::doc;
//! use emberdb::filter::field;
//!
//! let users = db.collection("users")?;
//! users.insert(doc! { name: "Alice", address: { city: "Paris" } })?;
//! let cursor = users.find(field("address.city").eq("Paris"))?;
//! ```
//!
//! [`Value`]: crate::common::Value

#[allow(clippy::module_inception)]
mod collection;
mod doc_id;
mod document;
mod find_options;
pub(crate) mod operation;
pub(crate) mod snowflake;

pub use collection::*;
pub use doc_id::*;
pub use document::*;
pub use find_options::*;
