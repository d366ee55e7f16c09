//! The authenticated caller.

use serde::{Deserialize, Serialize};
use ujian_core::UserId;

/// Identity produced by the session store for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: UserId,
    email: Option<String>,
}

impl Principal {
    /// Creates a principal with no known email.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self { id, email: None }
    }

    /// Attaches the email reported by the authentication service.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.is_empty());
        self
    }

    /// Returns the principal's user ID.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the principal's email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
