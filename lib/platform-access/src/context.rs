//! Request-scoped identity.
//!
//! The gate builds one [`RequestContext`] per request once the principal and
//! role are known, and hands it to downstream handlers. Nothing is kept
//! between requests.

use serde::Serialize;

use crate::principal::Principal;
use crate::role::{EffectiveRole, Role};

/// Who is calling, and with which role, for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    principal: Principal,
    role: EffectiveRole,
}

impl RequestContext {
    /// Creates a context for a resolved principal.
    #[must_use]
    pub fn new(principal: Principal, role: EffectiveRole) -> Self {
        Self { principal, role }
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the role the gate acted on.
    #[must_use]
    pub fn effective_role(&self) -> &EffectiveRole {
        &self.role
    }

    /// Returns the role if it is a member of the closed set.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.known()
    }

    /// Returns true if the caller holds exactly the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Returns a serializable summary of the context.
    #[must_use]
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            user_id: self.principal.id().to_string(),
            email: self.principal.email().map(str::to_string),
            role: self.role.clone(),
            dashboard: self.role().map(Role::dashboard_path),
        }
    }
}

/// JSON view of a [`RequestContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub user_id: String,
    pub email: Option<String>,
    pub role: EffectiveRole,
    pub dashboard: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal::new("u-7".parse().expect("id")).with_email(Some("dosen@poltrans.com".into()))
    }

    #[test]
    fn summary_of_known_role() {
        let ctx = RequestContext::new(principal(), EffectiveRole::Known(Role::AdminProdi));
        let summary = ctx.summary();
        assert_eq!(summary.user_id, "u-7");
        assert_eq!(summary.dashboard.as_deref(), Some("/admin-prodi"));

        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["role"], "admin_prodi");
        assert_eq!(json["email"], "dosen@poltrans.com");
    }

    #[test]
    fn unrecognized_role_has_no_dashboard() {
        let ctx = RequestContext::new(principal(), EffectiveRole::Unrecognized("rektor".into()));
        assert_eq!(ctx.role(), None);
        assert!(!ctx.has_role(Role::Superadmin));
        let summary = ctx.summary();
        assert_eq!(summary.dashboard, None);
        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["role"], "rektor");
    }
}
