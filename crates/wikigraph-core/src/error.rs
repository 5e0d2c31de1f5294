use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("note not found: {id}")]
    NotFound { id: String },

    /// A rename stopped part-way; `rewritten` notes were already persisted.
    #[error("rename propagation failed after rewriting {rewritten} note(s)")]
    Propagation {
        rewritten: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GraphError {
    pub fn note_not_found(id: impl fmt::Display) -> Self {
        GraphError::NotFound { id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
