//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause. None of these
//! reach the caller of the gate: the gate logs them and continues under a
//! safe default.

use std::fmt;

/// Errors raised by the gate's collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The session store could not validate or refresh the session.
    SessionLookup { details: String },
    /// The profile store could not return the caller's role.
    ProfileLookup { details: String },
    /// A collaborator did not answer within the configured bound.
    Timeout { operation: &'static str, millis: u64 },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionLookup { details } => {
                write!(f, "session lookup failed: {details}")
            }
            Self::ProfileLookup { details } => {
                write!(f, "profile lookup failed: {details}")
            }
            Self::Timeout { operation, millis } => {
                write!(f, "{operation} timed out after {millis}ms")
            }
        }
    }
}

impl std::error::Error for AccessError {}
