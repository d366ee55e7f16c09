//! Dashboard roles and their two textual renderings.
//!
//! Roles are stored on the `users` profile table in underscore form
//! (`admin_prodi`) and appear in URL paths in hyphen form (`admin-prodi`).
//! Both renderings are defined exhaustively here; nothing else in the
//! workspace rewrites role strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level of an authenticated caller.
///
/// Each role owns exactly one dashboard namespace (`/<path form>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform-wide administrator.
    Superadmin,
    /// Administrator of a single study programme (program studi).
    AdminProdi,
    /// Lecturer.
    Dosen,
    /// Exam proctor.
    Pengawas,
    /// Student. Also the least-privileged fallback role.
    Mahasiswa,
}

impl Role {
    /// Every role, in privilege order.
    pub const ALL: [Role; 5] = [
        Role::Superadmin,
        Role::AdminProdi,
        Role::Dosen,
        Role::Pengawas,
        Role::Mahasiswa,
    ];

    /// Role applied when the profile store cannot supply one.
    pub const FALLBACK: Role = Role::Mahasiswa;

    /// Returns the form stored in the profile table.
    #[must_use]
    pub const fn to_stored_form(self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::AdminProdi => "admin_prodi",
            Self::Dosen => "dosen",
            Self::Pengawas => "pengawas",
            Self::Mahasiswa => "mahasiswa",
        }
    }

    /// Returns the form used as the first URL path segment.
    #[must_use]
    pub const fn to_path_form(self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::AdminProdi => "admin-prodi",
            Self::Dosen => "dosen",
            Self::Pengawas => "pengawas",
            Self::Mahasiswa => "mahasiswa",
        }
    }

    /// Parses the stored form. Path-form spellings are rejected.
    #[must_use]
    pub fn from_stored_form(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.to_stored_form() == value)
    }

    /// Parses a URL path segment. Stored-form spellings are rejected.
    #[must_use]
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.to_path_form() == segment)
    }

    /// Returns the root path of this role's dashboard, e.g. `/admin-prodi`.
    #[must_use]
    pub fn dashboard_path(self) -> String {
        format!("/{}", self.to_path_form())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_stored_form())
    }
}

/// Error returned when a stored role value is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    /// The rejected value.
    pub value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_stored_form(s).ok_or_else(|| ParseRoleError {
            value: s.to_string(),
        })
    }
}

/// The role the gate acts on for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EffectiveRole {
    /// A member of the closed role set.
    Known(Role),
    /// A non-empty stored value that is not a known role.
    Unrecognized(String),
}

impl EffectiveRole {
    /// Interprets the raw `role` column of a profile.
    ///
    /// A missing or blank value falls back to [`Role::FALLBACK`].
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Known(Role::FALLBACK),
            Some(raw) => match Role::from_stored_form(raw) {
                Some(role) => Self::Known(role),
                None => Self::Unrecognized(raw.to_string()),
            },
        }
    }

    /// Returns the role if it is a member of the closed set.
    #[must_use]
    pub fn known(&self) -> Option<Role> {
        match self {
            Self::Known(role) => Some(*role),
            Self::Unrecognized(_) => None,
        }
    }
}

impl Default for EffectiveRole {
    fn default() -> Self {
        Self::Known(Role::FALLBACK)
    }
}

impl fmt::Display for EffectiveRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(role) => fmt::Display::fmt(role, f),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn renderings_are_inverse_bijections() {
        let stored: HashSet<_> = Role::ALL.iter().map(|r| r.to_stored_form()).collect();
        let path: HashSet<_> = Role::ALL.iter().map(|r| r.to_path_form()).collect();
        assert_eq!(stored.len(), Role::ALL.len());
        assert_eq!(path.len(), Role::ALL.len());

        for role in Role::ALL {
            assert_eq!(Role::from_stored_form(role.to_stored_form()), Some(role));
            assert_eq!(Role::from_path_segment(role.to_path_form()), Some(role));
        }
    }

    #[test]
    fn admin_prodi_uses_distinct_spellings() {
        assert_eq!(Role::AdminProdi.to_stored_form(), "admin_prodi");
        assert_eq!(Role::AdminProdi.to_path_form(), "admin-prodi");
        assert_eq!(Role::from_path_segment("admin_prodi"), None);
        assert_eq!(Role::from_stored_form("admin-prodi"), None);
    }

    #[test]
    fn dashboard_path_uses_path_form() {
        assert_eq!(Role::AdminProdi.dashboard_path(), "/admin-prodi");
        assert_eq!(Role::Superadmin.dashboard_path(), "/superadmin");
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Dosen".parse::<Role>().is_err());
        assert_eq!("dosen".parse::<Role>(), Ok(Role::Dosen));
    }

    #[test]
    fn effective_role_falls_back_to_mahasiswa() {
        assert_eq!(
            EffectiveRole::from_stored(None),
            EffectiveRole::Known(Role::Mahasiswa)
        );
        assert_eq!(
            EffectiveRole::from_stored(Some("  ")),
            EffectiveRole::Known(Role::Mahasiswa)
        );
        assert_eq!(EffectiveRole::default().known(), Some(Role::Mahasiswa));
    }

    #[test]
    fn effective_role_keeps_unknown_values() {
        let role = EffectiveRole::from_stored(Some("wakil_direktur"));
        assert_eq!(role, EffectiveRole::Unrecognized("wakil_direktur".into()));
        assert_eq!(role.known(), None);
    }

    #[test]
    fn role_serializes_in_stored_form() {
        let json = serde_json::to_string(&Role::AdminProdi).expect("serialize");
        assert_eq!(json, "\"admin_prodi\"");
        let parsed: Role = serde_json::from_str("\"pengawas\"").expect("deserialize");
        assert_eq!(parsed, Role::Pengawas);
    }
}
