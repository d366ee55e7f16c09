//! Login page and dashboard placeholders.

use axum::{
    Json,
    extract::Query,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use ujian_platform_access::{ContextSummary, Role, route};

use crate::auth::MaybeUser;

/// One entry of a dashboard's navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: &'static str,
    /// Path below the namespace root; empty for the root itself.
    pub section: &'static str,
}

const fn item(title: &'static str, section: &'static str) -> MenuItem {
    MenuItem { title, section }
}

const SUPERADMIN_MENU: &[MenuItem] = &[
    item("Dashboard", ""),
    item("Manajemen User", "users"),
    item("Program Studi", "prodi"),
    item("Kelas", "kelas"),
    item("Mata Kuliah", "matkul"),
    item("Jadwal Ujian", "jadwal"),
    item("Cetak Kartu", "kartu"),
    item("Ruang Ujian", "ruang"),
    item("Rekap Nilai", "nilai"),
    item("Rekap Kehadiran", "kehadiran"),
    item("Rekap Nilai Mahasiswa", "nilai-mahasiswa"),
    item("Ekspor Data", "ekspor"),
    item("Pengaturan", "settings"),
];

const ADMIN_PRODI_MENU: &[MenuItem] = &[
    item("Dashboard", ""),
    item("Manajemen User", "users"),
    item("Kelas", "kelas"),
    item("Mata Kuliah", "matkul"),
    item("Jadwal Ujian", "jadwal"),
    item("Cetak Kartu", "kartu"),
    item("Ruang Ujian", "ruang"),
    item("Rekap Nilai", "nilai"),
    item("Rekap Kehadiran", "kehadiran"),
    item("Rekap Berita Acara", "berita-acara"),
    item("Rekap Nilai Mahasiswa", "nilai-mahasiswa"),
    item("Ekspor Data", "ekspor"),
    item("Pengaturan", "settings"),
];

const DOSEN_MENU: &[MenuItem] = &[
    item("Dashboard", ""),
    item("Buat Soal", "soal"),
    item("Koreksi Ujian", "koreksi"),
    item("Nilai Ujian", "nilai"),
    item("Nilai Akhir", "nilai-akhir"),
];

const PENGAWAS_MENU: &[MenuItem] = &[
    item("Dashboard", ""),
    item("Monitor Ujian", "monitor"),
    item("Kehadiran", "kehadiran"),
    item("Berita Acara", "berita-acara"),
];

const MAHASISWA_MENU: &[MenuItem] = &[
    item("Dashboard", ""),
    item("Ujian", "ujian"),
    item("Hasil Ujian", "hasil"),
    item("Safe Exam Browser", "seb"),
];

/// Returns the navigation menu of a role's dashboard.
#[must_use]
pub fn menu(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Superadmin => SUPERADMIN_MENU,
        Role::AdminProdi => ADMIN_PRODI_MENU,
        Role::Dosen => DOSEN_MENU,
        Role::Pengawas => PENGAWAS_MENU,
        Role::Mahasiswa => MAHASISWA_MENU,
    }
}

#[derive(Debug, Serialize)]
struct MenuLink {
    title: &'static str,
    href: String,
}

#[derive(Debug, Serialize)]
struct DashboardView {
    namespace: Role,
    section: String,
    title: &'static str,
    menu: Vec<MenuLink>,
    viewer: Option<ContextSummary>,
}

/// Serves a placeholder for a dashboard page.
///
/// The gate guarantees the caller owns the namespace; the page only
/// describes where the caller is.
pub async fn dashboard(MaybeUser(viewer): MaybeUser, uri: Uri) -> Response {
    let path = uri.path();
    let Some(namespace) = route::role_namespace(path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let section = path
        .strip_prefix(namespace.dashboard_path().as_str())
        .unwrap_or_default()
        .trim_matches('/')
        .to_string();

    let items = menu(namespace);
    let Some(current) = items.iter().find(|entry| entry.section == section) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Page not found", "namespace": namespace, "section": section })),
        )
            .into_response();
    };

    let root = namespace.dashboard_path();
    let menu = items
        .iter()
        .map(|entry| MenuLink {
            title: entry.title,
            href: if entry.section.is_empty() {
                root.clone()
            } else {
                format!("{}/{}", root, entry.section)
            },
        })
        .collect();

    Json(DashboardView {
        namespace,
        section,
        title: current.title,
        menu,
        viewer: viewer.map(|context| context.summary()),
    })
    .into_response()
}

/// Query of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    error: Option<String>,
}

fn login_error_message(code: &str) -> &'static str {
    match code {
        "invalid_credentials" => "Email atau password salah.",
        "missing_credentials" => "Email dan password wajib diisi.",
        _ => "Gagal masuk. Periksa email dan password.",
    }
}

/// Serves the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    let alert = query
        .error
        .as_deref()
        .map(|code| format!(r#"<p class="alert" role="alert">{}</p>"#, login_error_message(code)))
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Online Examination System</title>
<link rel="stylesheet" href="/static/app.css">
</head>
<body>
<main class="login">
<h1>Online Examination System</h1>
<p>Masuk untuk melanjutkan ke dashboard.</p>
{alert}
<form method="post" action="/auth/login">
<label>Email <input type="email" name="email" placeholder="nama@poltrans.com" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Masuk</button>
</form>
</main>
</body>
</html>
"#
    ))
}
