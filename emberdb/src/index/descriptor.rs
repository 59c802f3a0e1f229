use crate::errors::EmberError;
use crate::index::IndexKind;

/// Build state of a catalog entry.
#[derive(Debug, Clone)]
pub enum BuildState {
    /// A build is populating the index. Value indexes are not used for
    /// queries in this state, text indexes already answer searches.
    Building,
    Built,
    /// A background build failed. The entry holds no usable data.
    Failed(EmberError),
}

impl BuildState {
    pub fn is_built(&self) -> bool {
        matches!(self, BuildState::Built)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BuildState::Failed(_))
    }

    /// The failure cause of a failed build.
    pub fn failure(&self) -> Option<&EmberError> {
        match self {
            BuildState::Failed(cause) => Some(cause),
            _ => None,
        }
    }
}

impl PartialEq for BuildState {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (BuildState::Building, BuildState::Building)
                | (BuildState::Built, BuildState::Built)
                | (BuildState::Failed(_), BuildState::Failed(_))
        )
    }
}

/// A snapshot of one catalog entry: the indexed field, the index kind and
/// its build state.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    field: String,
    kind: IndexKind,
    state: BuildState,
}

impl Index {
    pub(crate) fn new(field: &str, kind: IndexKind, state: BuildState) -> Self {
        Index {
            field: field.to_string(),
            kind,
            state,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }
}
