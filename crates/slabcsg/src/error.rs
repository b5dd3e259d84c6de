//! Error types for component construction.

use slabcsg_config::ConfigError;
use slabcsg_geom::GeomError;
use thiserror::Error;

/// Errors that abort a component build.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A variable is missing or has the wrong type.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The geometry model rejected an operation.
    #[error(transparent)]
    Geom(#[from] GeomError),

    /// A variable is present but its value is unusable.
    #[error("invalid value for `{key}`: {reason}")]
    InvalidConfig {
        /// The offending key.
        key: String,
        /// Reason for rejection.
        reason: String,
    },

    /// A partition list has the wrong number of points.
    #[error("`{key}` needs {expected} partition points, found {found}")]
    PartitionLength {
        /// The partition key.
        key: String,
        /// Points required by the grid size.
        expected: usize,
        /// Points supplied.
        found: usize,
    },

    /// A 3D grid buffer does not match its shape.
    #[error("grid shape {shape:?} needs {expected} values, got {found}")]
    Shape {
        /// `[layers, columns, rows]`.
        shape: [usize; 3],
        /// Product of the shape.
        expected: usize,
        /// Length supplied.
        found: usize,
    },

    /// An index is outside the component.
    #[error("{component}: {what} index {index} out of range (size {size})")]
    Index {
        /// Component key name.
        component: String,
        /// Kind of index (layer, column, row).
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Valid range is `0..size`.
        size: usize,
    },

    /// Construction steps were called out of order.
    #[error("{component}: {step} requires {requires} first")]
    Phase {
        /// Component key name.
        component: String,
        /// Step that was attempted.
        step: &'static str,
        /// Step that has to run before it.
        requires: &'static str,
    },
}

impl BuildError {
    pub(crate) fn phase(component: &str, step: &'static str, requires: &'static str) -> Self {
        BuildError::Phase {
            component: component.to_string(),
            step,
            requires,
        }
    }

    pub(crate) fn index(component: &str, what: &'static str, index: usize, size: usize) -> Self {
        BuildError::Index {
            component: component.to_string(),
            what,
            index,
            size,
        }
    }

    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for component construction.
pub type Result<T> = std::result::Result<T, BuildError>;
