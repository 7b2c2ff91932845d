use thiserror::Error;

use crate::engine::types::ObjectId;

/// Interface-misuse errors surfaced to the embedding engine adapter.
///
/// Everything the simulation can throw at the core during normal play
/// (stale targets, allocation conflicts, unsolvable positions) is recovered
/// locally and never reaches this enum.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown agent: {0:?}")]
    UnknownAgent(ObjectId),
    #[error("duplicate spawn for agent {0:?}")]
    DuplicateSpawn(ObjectId),
}

pub type Result<T> = std::result::Result<T, CoreError>;
