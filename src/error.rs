use std::io;

use thiserror::Error;

use crate::game::{Direction, MAX_SIZE};

/// Error type for every engine operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("level is {width}x{height}, larger than the {max}x{max} limit", max = MAX_SIZE)]
    LevelTooLarge { width: usize, height: usize },

    #[error("level has {boxes} boxes but {goals} goals")]
    UnbalancedLevel { boxes: usize, goals: usize },

    #[error("level has no boxes or no goals")]
    EmptyLevel,

    #[error("level must have exactly one player, found {0}")]
    PlayerCount(usize),

    #[error("invalid character {symbol:?} at position ({x}, {y})")]
    InvalidSymbol { symbol: char, x: usize, y: usize },

    #[error("no levels loaded ({rejected} rejected)")]
    NoLevelsLoaded { rejected: usize },

    #[error("run-length code ends with a count but no symbol")]
    MalformedCode,

    #[error("invalid solution syntax at position {position}: {found:?}")]
    InvalidSolutionSyntax { position: usize, found: Option<char> },

    #[error("move #{} ({direction}) is blocked during replay", .index + 1)]
    IllegalReplay { index: usize, direction: Direction },

    #[error("invalid store namespace {0:?}")]
    InvalidNamespace(String),

    #[error("solution store unavailable: {0}")]
    StoreUnavailable(#[source] io::Error),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("level {path} unavailable: {reason}")]
    LevelFetchFailed { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
