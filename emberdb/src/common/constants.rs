// doc constants
pub const DOC_ID: &str = "_id";
pub const RESERVED_FIELDS: [&str; 1] = [DOC_ID];

// index constants
pub const UNIQUE_INDEX: &str = "unique";
pub const NON_UNIQUE_INDEX: &str = "non-unique";
pub const FULL_TEXT_INDEX: &str = "full-text";

pub const DEFAULT_FIELD_SEPARATOR: &str = ".";
pub const EMBERDB_VERSION: &str = env!("CARGO_PKG_VERSION");
