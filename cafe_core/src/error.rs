//! Error classification shared by every module.

use serde::Serialize;

/// Coarse category of a failure, used to pick a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input
    Validation,
    /// Missing tournament, registration or user
    NotFound,
    /// Duplicate registration or closed registration window
    Conflict,
    /// No free slot
    Capacity,
    /// Unexpected database failure
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Capacity => "capacity",
            ErrorKind::Internal => "internal",
        }
    }
}
