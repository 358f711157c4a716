use dom::{NodeRef, TreeError};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// The selection references a node that was detached.
    StaleNodeReference(NodeRef),
    Tree(TreeError),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::StaleNodeReference(node) => {
                write!(f, "selection references removed node {node}")
            }
            SelectionError::Tree(err) => write!(f, "tree operation failed: {err}"),
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectionError::Tree(err) => Some(err),
            SelectionError::StaleNodeReference(_) => None,
        }
    }
}

impl From<TreeError> for SelectionError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::StaleNode(node) => SelectionError::StaleNodeReference(node),
            other => SelectionError::Tree(other),
        }
    }
}

pub type SelectionResult<T> = Result<T, SelectionError>;
