//! Error types for cloud and score table construction.

use std::fmt;

/// Errors raised while building a score table or a vector cloud.
///
/// All variants are construction-time failures. Scoring never errors: out-of-range
/// queries are clamped into the table's domain instead.
#[derive(Debug, Clone)]
pub enum NblastError {
    /// A vector cloud cannot be built from an empty point set.
    NoPoints,

    /// The configured tangent neighborhood is larger than the cloud itself.
    InsufficientPoints { required: usize, available: usize },

    /// A flat coordinate buffer does not contain whole 3D points.
    DimensionMismatch { len: usize },

    /// Score table breakpoints or grid shape are invalid.
    MalformedTable(String),
}

impl fmt::Display for NblastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NblastError::NoPoints => {
                write!(f, "cannot build a vector cloud from an empty point set")
            }
            NblastError::InsufficientPoints {
                required,
                available,
            } => {
                write!(
                    f,
                    "insufficient points: tangent neighborhood needs {}, cloud has {}",
                    required, available
                )
            }
            NblastError::DimensionMismatch { len } => {
                write!(
                    f,
                    "flat coordinate buffer of length {} is not a whole number of 3D points",
                    len
                )
            }
            NblastError::MalformedTable(msg) => {
                write!(f, "malformed score table: {}", msg)
            }
        }
    }
}

impl std::error::Error for NblastError {}
