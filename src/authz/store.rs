use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::row_parsers::{
    department_from_row, employee_from_row, permission_from_row, position_from_row,
};
use crate::errors::AppError;
use crate::models::org::{Department, Employee, Position};
use crate::models::permission::{Permission, PermissionData};

use super::resolver::AuthzError;

/// The level at which an access grant or deny is recorded.
///
/// The four assignment tables share one shape (scope entity + permission +
/// access), so they sit behind a single lookup keyed by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Employee(Uuid),
    Position(Uuid),
    Department(Uuid),
    Global,
}

/// Read-only access to the org hierarchy: employee -> position ->
/// department -> parent-department edges.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    async fn employee(&self, id: Uuid) -> Result<Option<Employee>, AuthzError>;

    async fn position(&self, id: Uuid) -> Result<Option<Position>, AuthzError>;

    async fn department(&self, id: Uuid) -> Result<Option<Department>, AuthzError>;

    /// Total department count, used to bound ancestor walks.
    async fn department_count(&self) -> Result<u64, AuthzError>;
}

/// Read access to permission definitions and scoped grant rows, plus the
/// atomic registration upsert.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn permission_by_code(&self, code: &str) -> Result<Option<Permission>, AuthzError>;

    /// The access value recorded at `scope` for `permission_id`, if any.
    /// `Some(true)` is a grant, `Some(false)` a deny, `None` means inherit.
    async fn access_at(&self, scope: Scope, permission_id: Uuid)
        -> Result<Option<bool>, AuthzError>;

    /// Insert-or-update keyed on the unique permission code. Must leave
    /// `id` and existing grant rows untouched on conflict.
    async fn upsert_permission(&self, data: &PermissionData) -> Result<(), AuthzError>;
}

/// sqlx-backed store over the six core tables.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// A row that fetched fine but fails to parse is a store-side fault, keep it
// inside the Store variant rather than widening the error taxonomy.
fn decode_err(err: AppError) -> AuthzError {
    AuthzError::Store(sqlx::Error::Decode(Box::new(err)))
}

#[async_trait]
impl HierarchyStore for SqlStore {
    async fn employee(&self, id: Uuid) -> Result<Option<Employee>, AuthzError> {
        let row = sqlx::query(
            "SELECT id, name, email, position_id, is_admin, created_at, updated_at FROM employees WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(employee_from_row).transpose().map_err(decode_err)
    }

    async fn position(&self, id: Uuid) -> Result<Option<Position>, AuthzError> {
        let row = sqlx::query(
            "SELECT id, title, department_id, created_at, updated_at FROM positions WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(position_from_row).transpose().map_err(decode_err)
    }

    async fn department(&self, id: Uuid) -> Result<Option<Department>, AuthzError> {
        let row = sqlx::query(
            "SELECT id, name, parent_id, created_at, updated_at FROM departments WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(department_from_row).transpose().map_err(decode_err)
    }

    async fn department_count(&self) -> Result<u64, AuthzError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

#[async_trait]
impl GrantStore for SqlStore {
    async fn permission_by_code(&self, code: &str) -> Result<Option<Permission>, AuthzError> {
        let row = sqlx::query(
            "SELECT id, code, title, description, default_access, created_at, updated_at FROM permissions WHERE code = ?"
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(permission_from_row).transpose().map_err(decode_err)
    }

    async fn access_at(
        &self,
        scope: Scope,
        permission_id: Uuid,
    ) -> Result<Option<bool>, AuthzError> {
        let query = match scope {
            Scope::Employee(id) => sqlx::query(
                "SELECT access FROM employee_permissions WHERE employee_id = ? AND permission_id = ?"
            )
            .bind(id.to_string()),
            Scope::Position(id) => sqlx::query(
                "SELECT access FROM position_permissions WHERE position_id = ? AND permission_id = ?"
            )
            .bind(id.to_string()),
            Scope::Department(id) => sqlx::query(
                "SELECT access FROM department_permissions WHERE department_id = ? AND permission_id = ?"
            )
            .bind(id.to_string()),
            Scope::Global => {
                sqlx::query("SELECT access FROM global_permissions WHERE permission_id = ?")
            }
        };

        let row = query
            .bind(permission_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let access = row.map(|r| r.try_get::<i64, _>("access")).transpose()?;
        Ok(access.map(|value| value != 0))
    }

    async fn upsert_permission(&self, data: &PermissionData) -> Result<(), AuthzError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO permissions (id, code, title, description, default_access, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(code) DO UPDATE SET \
                title = excluded.title, \
                description = excluded.description, \
                default_access = excluded.default_access, \
                updated_at = excluded.updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&data.code)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.default_access)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
