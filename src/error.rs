use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Paper,
    Member,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "paper"),
            Self::Member => write!(f, "member"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("store failure: {0}")]
    Store(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OracleError>;

impl OracleError {
    pub fn paper_not_found(id: impl Display) -> Self {
        Self::NotFound {
            kind: EntityKind::Paper,
            id: id.to_string(),
        }
    }

    pub fn member_not_found(id: impl Display) -> Self {
        Self::NotFound {
            kind: EntityKind::Member,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
