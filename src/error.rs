//! Error taxonomy for the object store and everything built on it.
use std::io;
use thiserror::Error;

use crate::hash::Hash;

/// The five error kinds from the spec. `Malformed` conditions never reach
/// here — they are recovered locally into sentinel values (see
/// `objects::Identity::parse`).
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt object {hash}: {reason}")]
    Corrupt { hash: Hash, reason: String },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GitError>;
