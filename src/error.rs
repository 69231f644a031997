/// Error types for the simulation core and the level loader.
///
/// Only programmer errors and unreadable level data end up here.
/// Gameplay-invalid moves are silent no-ops and never produce an error.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("index ({x}, {y}) is outside the {width}x{height} grid")]
    IndexOutOfRange { x: i64, y: i64, width: usize, height: usize },

    #[error("({dx}, {dy}) is not a unit direction vector")]
    MalformedDirection { dx: i32, dy: i32 },

    #[error("grid size {width}x{height} is invalid, both sides must be at least 1")]
    InvalidGridSize { width: usize, height: usize },
}

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("could not read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Grid(#[from] SimError),

    #[error("level has no tile rows")]
    Empty,
}
