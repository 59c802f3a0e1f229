//! Query filters.
//!
//! Filters are built with the fluent API and combined with [`and`], [`or`]
//! or the chaining methods on [`Filter`]:
//!
//! ```rust,ignore
//! use emberdb::filter::{all, field};
//!
//! let filter = field("age").gt(30).and(field("status").eq("active"));
//! let everything = all();
//! ```

#[allow(clippy::module_inception)]
mod filter;
mod fluent;

pub use filter::*;
pub use fluent::*;
