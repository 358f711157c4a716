use dom::TreeError;
use selection::SelectionError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionError {
    /// A named transition was started before its timeline was configured.
    UnconfiguredTransition(String),
    Selection(SelectionError),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::UnconfiguredTransition(name) => {
                write!(f, "transition {name:?} has no configured timeline")
            }
            TransitionError::Selection(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TransitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransitionError::Selection(err) => Some(err),
            TransitionError::UnconfiguredTransition(_) => None,
        }
    }
}

impl From<SelectionError> for TransitionError {
    fn from(err: SelectionError) -> Self {
        TransitionError::Selection(err)
    }
}

impl From<TreeError> for TransitionError {
    fn from(err: TreeError) -> Self {
        TransitionError::Selection(SelectionError::from(err))
    }
}

pub type TransitionResult<T> = Result<T, TransitionError>;
