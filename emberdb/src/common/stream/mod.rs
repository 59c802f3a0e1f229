mod document_cursor;
mod joined_cursor;
mod projected_cursor;

pub use document_cursor::{DocumentCursor, DocumentIter};
pub use joined_cursor::*;
pub use projected_cursor::*;
