//! Direct database access to the `users` profile table.

use sqlx::{FromRow, PgPool};
use ujian_core::UserId;

/// Row type for role queries.
#[derive(FromRow)]
struct RoleRow {
    role: Option<String>,
}

/// Repository for profile rows.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Creates a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads the raw role of a user. `None` if the user has no profile row.
    pub async fn find_role(&self, id: &UserId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<RoleRow> = sqlx::query_as(
            r#"
            SELECT role::text AS role
            FROM users
            WHERE id = $1::uuid
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| r.role))
    }

    /// Deletes a profile row. Returns whether a row was removed.
    pub async fn delete(&self, id: &UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1::uuid
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
