use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use parking_lot::Mutex;
use std::sync::Arc;

/// Error kinds for emberdb operations.
///
/// Each kind names one category of failure so callers can branch on it,
/// e.g. treat [`ErrorKind::IndexingError`] as "retry later" and
/// [`ErrorKind::ValidationError`] as "fix the input".
///
/// ```rust,ignore
/// use emberdb::errors::{EmberError, ErrorKind, EmberResult};
///
/// fn example() -> EmberResult<()> {
///     Err(EmberError::new("index not found", ErrorKind::IndexNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A filter cannot be resolved
    FilterError,

    /// Index lifecycle conflict, such as a rebuild while a build is in flight
    IndexingError,
    /// The field has no index
    IndexNotFound,
    /// A unique index already holds the value
    UniqueConstraintViolation,

    /// The provided id is invalid
    InvalidId,
    /// The requested resource was not found
    NotFound,

    /// The operation is not permitted in the current context
    InvalidOperation,

    /// Caller supplied input is structurally invalid
    ValidationError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The error type of every fallible emberdb operation.
///
/// Carries a message, an [`ErrorKind`], an optional cause and a backtrace
/// captured at construction. The backtrace is symbolized only when the
/// error is debug-printed.
///
/// ```rust,ignore
/// let cause = EmberError::new("worker died", ErrorKind::InternalError);
/// let err = EmberError::new_with_cause("build failed", ErrorKind::IndexingError, cause);
/// ```
#[derive(Clone)]
pub struct EmberError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<EmberError>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl EmberError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        EmberError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new error chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: EmberError) -> Self {
        EmberError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&EmberError> {
        self.cause.as_deref()
    }
}

impl Display for EmberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for EmberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, *backtrace)
            }
        }
    }
}

impl Error for EmberError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, EmberError>`.
pub type EmberResult<T> = Result<T, EmberError>;

impl From<regex::Error> for EmberError {
    fn from(err: regex::Error) -> Self {
        EmberError::new(&format!("invalid regex pattern: {}", err), ErrorKind::FilterError)
    }
}

impl From<std::io::Error> for EmberError {
    fn from(err: std::io::Error) -> Self {
        EmberError::new(&format!("IO error: {}", err), ErrorKind::InternalError)
    }
}

impl From<std::num::ParseIntError> for EmberError {
    fn from(err: std::num::ParseIntError) -> Self {
        EmberError::new(&format!("integer parsing error: {}", err), ErrorKind::InvalidId)
    }
}
