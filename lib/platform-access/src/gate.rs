//! The per-request access gate.
//!
//! For every request the gate resolves the session, looks up the caller's
//! role, and decides whether the request may proceed to the path it asked
//! for. Collaborator failures never surface to the caller: a failed session
//! lookup is treated as anonymous, a failed role lookup as
//! [`Role::FALLBACK`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rootcause::prelude::Report;
use tracing::{debug, instrument, warn};

use crate::context::RequestContext;
use crate::error::AccessError;
use crate::principal::Principal;
use crate::role::{EffectiveRole, Role};
use crate::route;
use crate::session::{SessionCredentials, SessionResolution, SessionUpdate};
use crate::store::{ProfileStore, SessionStore};

/// Default bound on each collaborator call.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(300);

/// What the gate decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through unmodified.
    Allow,
    /// Send the caller to the login root.
    RedirectToLogin,
    /// Send the caller to their own dashboard.
    RedirectToDashboard(Role),
    /// Refuse the request; no safe redirect target exists.
    Deny,
}

impl Decision {
    /// Returns the redirect target, if this decision is a redirect.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Self::RedirectToLogin => Some(route::LOGIN_ROOT.to_string()),
            Self::RedirectToDashboard(role) => Some(role.dashboard_path()),
            Self::Allow | Self::Deny => None,
        }
    }
}

/// Everything the caller of the gate needs to finish the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// The access decision.
    pub decision: Decision,
    /// Session changes to write to the response, whatever the decision.
    pub session_update: SessionUpdate,
    /// Identity of the caller, when one was resolved.
    pub context: Option<RequestContext>,
}

impl GateOutcome {
    fn anonymous(decision: Decision, session_update: SessionUpdate) -> Self {
        Self {
            decision,
            session_update,
            context: None,
        }
    }
}

/// Whether the gate enforces access at all.
#[derive(Clone)]
pub enum GateMode {
    /// The backing service is not configured; every request is allowed.
    Bypass { reason: String },
    /// Sessions and roles are checked on every request.
    Enforcing {
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
    },
}

impl std::fmt::Debug for GateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bypass { reason } => f.debug_struct("Bypass").field("reason", reason).finish(),
            Self::Enforcing { .. } => f.write_str("Enforcing"),
        }
    }
}

/// Role-scoped access gate.
#[derive(Debug, Clone)]
pub struct AccessGate {
    mode: GateMode,
    lookup_timeout: Duration,
    session_timeout: Duration,
}

impl AccessGate {
    /// Creates an enforcing gate over the given collaborators.
    ///
    /// `lookup_timeout` bounds one call to the backing service. Resolving a
    /// session may take two (validate, then refresh), so the session lookup
    /// gets twice that unless [`AccessGate::with_session_timeout`] says
    /// otherwise.
    #[must_use]
    pub fn enforcing(
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            mode: GateMode::Enforcing { sessions, profiles },
            lookup_timeout,
            session_timeout: lookup_timeout.saturating_mul(2),
        }
    }

    /// Overrides the bound on a whole session lookup, refresh included.
    #[must_use]
    pub fn with_session_timeout(mut self, session_timeout: Duration) -> Self {
        self.session_timeout = session_timeout;
        self
    }

    /// Creates a gate that lets every request through.
    ///
    /// Only for deployments where the backing service is not configured.
    #[must_use]
    pub fn bypass(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(%reason, "access gate disabled: every request will be allowed");
        Self {
            mode: GateMode::Bypass { reason },
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            session_timeout: DEFAULT_LOOKUP_TIMEOUT.saturating_mul(2),
        }
    }

    /// Returns the gate's mode.
    #[must_use]
    pub fn mode(&self) -> &GateMode {
        &self.mode
    }

    /// Returns true if the gate is in bypass mode.
    #[must_use]
    pub fn is_bypassed(&self) -> bool {
        matches!(self.mode, GateMode::Bypass { .. })
    }

    /// Decides what to do with a request for `path`.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn evaluate(&self, path: &str, credentials: &SessionCredentials) -> GateOutcome {
        let (sessions, profiles) = match &self.mode {
            GateMode::Bypass { reason } => {
                warn!(%reason, "backing service not configured, bypassing access checks");
                return GateOutcome::anonymous(Decision::Allow, SessionUpdate::Unchanged);
            }
            GateMode::Enforcing { sessions, profiles } => (sessions, profiles),
        };

        let SessionResolution { principal, update } =
            self.resolve_session(sessions.as_ref(), credentials).await;

        let Some(principal) = principal else {
            let decision = if route::is_public(path) {
                Decision::Allow
            } else {
                Decision::RedirectToLogin
            };
            debug!(?decision, "anonymous request");
            return GateOutcome::anonymous(decision, update);
        };

        let role = self.resolve_role(profiles.as_ref(), &principal).await;
        let decision = decide(path, &role);
        debug!(user_id = %principal.id(), ?role, ?decision, "authenticated request");

        if decision == Decision::Deny {
            warn!(
                user_id = %principal.id(),
                ?role,
                "stored role is not a known dashboard role, denying request"
            );
        }

        GateOutcome {
            decision,
            session_update: update,
            context: Some(RequestContext::new(principal, role)),
        }
    }

    async fn resolve_session(
        &self,
        sessions: &dyn SessionStore,
        credentials: &SessionCredentials,
    ) -> SessionResolution {
        let lookup = sessions.resolve(credentials);
        match bounded(self.session_timeout, "session lookup", lookup).await {
            Ok(resolution) => resolution,
            Err(report) => {
                warn!(error = %report, "session lookup failed, treating request as anonymous");
                SessionResolution::anonymous()
            }
        }
    }

    async fn resolve_role(
        &self,
        profiles: &dyn ProfileStore,
        principal: &Principal,
    ) -> EffectiveRole {
        let lookup = profiles.stored_role(principal.id());
        match bounded(self.lookup_timeout, "profile lookup", lookup).await {
            Ok(stored) => {
                if stored.is_none() {
                    debug!(user_id = %principal.id(), "no profile role, using fallback role");
                }
                EffectiveRole::from_stored(stored.as_deref())
            }
            Err(report) => {
                warn!(
                    user_id = %principal.id(),
                    error = %report,
                    "profile lookup failed, using fallback role"
                );
                EffectiveRole::Known(Role::FALLBACK)
            }
        }
    }
}

/// Path-role matching for an authenticated caller.
fn decide(path: &str, role: &EffectiveRole) -> Decision {
    let needs_own_dashboard = match route::role_namespace(path) {
        Some(path_role) => role.known() != Some(path_role),
        None => route::is_login_root(path),
    };

    if !needs_own_dashboard {
        return Decision::Allow;
    }

    match role {
        EffectiveRole::Known(own) => Decision::RedirectToDashboard(*own),
        EffectiveRole::Unrecognized(_) => Decision::Deny,
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, Report<AccessError>>>,
) -> Result<T, Report<AccessError>> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AccessError::Timeout {
            operation,
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
        .into()),
    }
}
