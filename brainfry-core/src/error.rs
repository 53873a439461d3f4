use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unbalanced brackets: ']' at instruction {position} has no matching '['")]
    UnmatchedClose { position: usize },
    #[error("unbalanced brackets: '[' at instruction {position} is never closed")]
    UnclosedOpen { position: usize },
    #[error("failed to read source {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write assembly to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to emit assembly: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Instruction pointer of the offending bracket, for structural errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            CoreError::UnmatchedClose { position } | CoreError::UnclosedOpen { position } => {
                Some(*position)
            }
            _ => None,
        }
    }
}
