//! Error types for the geometry model.

use crate::{CellId, SurfaceId};
use thiserror::Error;

/// Errors raised by the cell/surface model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// A cell was expected in the model but is not there.
    #[error("cell {0} not found in model")]
    MissingCell(CellId),

    /// A cell id is already taken.
    #[error("cell {0} already exists in model")]
    DuplicateCell(CellId),

    /// A rule references a surface the model does not own.
    #[error("surface {0} not found in model")]
    UnknownSurface(SurfaceId),

    /// The id allocator ran past `u32::MAX`.
    #[error("no {0} ids left")]
    IdsExhausted(&'static str),

    /// A half-space rule string could not be parsed.
    #[error("invalid rule string `{input}`: {reason}")]
    RuleParse {
        /// The text that failed to parse.
        input: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, GeomError>;
