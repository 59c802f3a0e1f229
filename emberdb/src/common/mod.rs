//! Shared types and utilities: the [`Value`] domain, sort order, cursors
//! and the background task executor.

mod constants;
mod sort_order;
pub mod stream;
pub mod util;
mod value;

pub use constants::*;
pub use sort_order::*;
pub use stream::*;
pub use util::*;
pub use value::*;
