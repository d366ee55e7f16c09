//! Role-scoped access control for the ujian examination dashboard.
//!
//! This crate provides:
//! - The closed dashboard role set (`Role`) with its stored and path forms
//! - Session credential and refresh types (`SessionCredentials`, `SessionUpdate`)
//! - Collaborator contracts for session and profile lookup
//! - The per-request `AccessGate` and the `RequestContext` it produces
//!
//! # Access Control Model
//!
//! Every dashboard lives under a namespace named after a role
//! (`/superadmin`, `/admin-prodi`, `/dosen`, `/pengawas`, `/mahasiswa`).
//! A caller may only use the namespace of their own role; requests for any
//! other namespace are redirected to the caller's own dashboard root.
//! Anonymous callers may only reach the public login routes.
//!
//! # Example
//!
//! ```
//! use ujian_platform_access::{EffectiveRole, Role, route};
//!
//! assert_eq!(route::role_namespace("/admin-prodi/users"), Some(Role::AdminProdi));
//! assert_eq!(Role::AdminProdi.to_stored_form(), "admin_prodi");
//!
//! // A profile without a role is treated as the least-privileged role.
//! assert_eq!(EffectiveRole::from_stored(None).known(), Some(Role::Mahasiswa));
//! ```

pub mod context;
pub mod error;
pub mod gate;
pub mod principal;
pub mod role;
pub mod route;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use context::{ContextSummary, RequestContext};
pub use error::AccessError;
pub use gate::{AccessGate, DEFAULT_LOOKUP_TIMEOUT, Decision, GateMode, GateOutcome};
pub use principal::Principal;
pub use role::{EffectiveRole, ParseRoleError, Role};
pub use route::ExclusionList;
pub use session::{SessionCredentials, SessionResolution, SessionTokens, SessionUpdate};
pub use store::{ProfileStore, SessionStore};
