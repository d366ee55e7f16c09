//! Path classification used by the gate.

use serde::Deserialize;

use crate::role::Role;

/// Path of the login screen.
pub const LOGIN_ROOT: &str = "/";

/// Returns the first non-empty path segment, e.g. `dosen` for `/dosen/soal`.
#[must_use]
pub fn first_segment(path: &str) -> Option<&str> {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Returns true for the login root itself.
#[must_use]
pub fn is_login_root(path: &str) -> bool {
    path == LOGIN_ROOT
}

/// Returns true if the path needs no login.
///
/// Public paths are the login root, `/login`, and anything under the
/// `auth` segment (`/auth`, `/auth/login`, ...). `/authors` is not public.
#[must_use]
pub fn is_public(path: &str) -> bool {
    is_login_root(path) || path == "/login" || first_segment(path) == Some("auth")
}

/// Returns the dashboard namespace a path belongs to, if any.
#[must_use]
pub fn role_namespace(path: &str) -> Option<Role> {
    first_segment(path).and_then(Role::from_path_segment)
}

/// Requests that never reach the gate (static assets).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExclusionList {
    /// Path prefixes served without a gate check.
    #[serde(default = "default_prefixes")]
    prefixes: Vec<String>,
    /// Exact paths served without a gate check.
    #[serde(default = "default_exact")]
    exact: Vec<String>,
    /// File extensions (without the dot) served without a gate check.
    #[serde(default = "default_extensions")]
    extensions: Vec<String>,
}

fn default_prefixes() -> Vec<String> {
    vec!["/static/".to_string()]
}

fn default_exact() -> Vec<String> {
    vec!["/favicon.ico".to_string()]
}

fn default_extensions() -> Vec<String> {
    ["svg", "png", "jpg", "jpeg", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            exact: default_exact(),
            extensions: default_extensions(),
        }
    }
}

impl ExclusionList {
    /// Creates an exclusion list from explicit entries.
    #[must_use]
    pub fn new(prefixes: Vec<String>, exact: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            prefixes,
            exact,
            extensions,
        }
    }

    /// Returns true if the path bypasses the gate.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.exact.iter().any(|exact| exact == path) {
            return true;
        }
        if self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return true;
        }

        let last = path.rsplit('/').next().unwrap_or_default();
        match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_segment_of_paths() {
        assert_eq!(first_segment("/"), None);
        assert_eq!(first_segment(""), None);
        assert_eq!(first_segment("/dosen"), Some("dosen"));
        assert_eq!(first_segment("/dosen/soal/12"), Some("dosen"));
        assert_eq!(first_segment("/superadmin/"), Some("superadmin"));
    }

    #[test]
    fn public_paths() {
        assert!(is_public("/"));
        assert!(is_public("/login"));
        assert!(is_public("/auth"));
        assert!(is_public("/auth/login"));
        assert!(is_public("/auth/callback"));
        assert!(!is_public("/authors"));
        assert!(!is_public("/mahasiswa"));
        assert!(!is_public("/api/me"));
    }

    #[test]
    fn role_namespaces() {
        assert_eq!(role_namespace("/admin-prodi/users"), Some(Role::AdminProdi));
        assert_eq!(role_namespace("/admin_prodi"), None);
        assert_eq!(role_namespace("/pengawas"), Some(Role::Pengawas));
        assert_eq!(role_namespace("/api/me"), None);
        assert_eq!(role_namespace("/"), None);
    }

    #[test]
    fn default_exclusions() {
        let list = ExclusionList::default();
        assert!(list.matches("/static/app.css"));
        assert!(list.matches("/favicon.ico"));
        assert!(list.matches("/logo.png"));
        assert!(list.matches("/images/Banner.JPG"));
        assert!(!list.matches("/"));
        assert!(!list.matches("/superadmin"));
        assert!(!list.matches("/superadmin/report.pdf"));
        assert!(!list.matches("/pkg/ujian.wasm"));
        assert!(!list.matches("/.png"));
    }

    #[test]
    fn custom_exclusions() {
        let list = ExclusionList::new(vec!["/assets/".into()], vec![], vec!["css".into()]);
        assert!(list.matches("/assets/x"));
        assert!(list.matches("/dosen/theme.css"));
        assert!(!list.matches("/static/app.js"));
        assert!(!list.matches("/favicon.ico"));
    }
}
