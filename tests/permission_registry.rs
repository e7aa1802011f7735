use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use hr_authz::authz::{self, PermissionResolver, SqlStore};
use hr_authz::models::permission::PermissionData;

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect");

    let ddl = [
        "CREATE TABLE permissions (id TEXT PRIMARY KEY, code TEXT NOT NULL UNIQUE, title TEXT NOT NULL, description TEXT, default_access INTEGER NOT NULL DEFAULT 0, created_at TEXT NOT NULL, updated_at TEXT NOT NULL)",
        "CREATE TABLE employees (id TEXT PRIMARY KEY, name TEXT NOT NULL, email TEXT NOT NULL, position_id TEXT, is_admin INTEGER NOT NULL DEFAULT 0, created_at TEXT NOT NULL, updated_at TEXT NOT NULL)",
        "CREATE TABLE employee_permissions (id TEXT PRIMARY KEY, employee_id TEXT NOT NULL, permission_id TEXT NOT NULL, access INTEGER NOT NULL, created_at TEXT NOT NULL, UNIQUE (employee_id, permission_id))",
    ];
    for stmt in ddl {
        sqlx::query(stmt).execute(&pool).await.expect("schema");
    }

    pool
}

#[tokio::test]
async fn registering_twice_keeps_one_row_and_latest_fields() {
    let pool = setup_pool().await;
    let resolver = PermissionResolver::new(SqlStore::new(pool.clone()));

    let first = PermissionData::new("reports.export", "Export reports", false);
    resolver.ensure_registered(&first).await.unwrap();

    let row = sqlx::query("SELECT id FROM permissions WHERE code = 'reports.export'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let original_id: String = row.get("id");

    let second = PermissionData::new("reports.export", "Export all reports", true)
        .with_description("Bulk export of reporting data");
    resolver.ensure_registered(&second).await.unwrap();

    let rows = sqlx::query("SELECT id, title, description, default_access FROM permissions WHERE code = 'reports.export'")
        .fetch_all(&pool)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let kept_id: String = rows[0].get("id");
    let title: String = rows[0].get("title");
    let description: Option<String> = rows[0].get("description");
    let default_access: i64 = rows[0].get("default_access");

    assert_eq!(kept_id, original_id);
    assert_eq!(title, "Export all reports");
    assert_eq!(description.as_deref(), Some("Bulk export of reporting data"));
    assert_eq!(default_access, 1);
}

#[tokio::test]
async fn re_registration_leaves_existing_grants_valid() {
    let pool = setup_pool().await;
    let resolver = PermissionResolver::new(SqlStore::new(pool.clone()));

    resolver
        .ensure_registered(&PermissionData::new("reports.export", "Export reports", false))
        .await
        .unwrap();

    let row = sqlx::query("SELECT id FROM permissions WHERE code = 'reports.export'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let permission_id: String = row.get("id");

    // Administrator grants the permission to an employee, then the module
    // re-registers on a later boot.
    let employee_id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    sqlx::query("INSERT INTO employees (id, name, email, position_id, is_admin, created_at, updated_at) VALUES (?, 'E', 'e@example.com', NULL, 0, ?, ?)")
        .bind(employee_id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO employee_permissions (id, employee_id, permission_id, access, created_at) VALUES (?, ?, ?, 1, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(employee_id.to_string())
        .bind(&permission_id)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap();

    resolver
        .ensure_registered(&PermissionData::new("reports.export", "Export reports v2", false))
        .await
        .unwrap();

    // The grant still joins to the same permission row, so the employee
    // keeps the access the administrator configured.
    assert!(resolver.has_permission(employee_id, "reports.export").await.unwrap());
}

#[tokio::test]
async fn builtin_registration_is_idempotent() {
    let pool = setup_pool().await;
    let resolver = PermissionResolver::new(SqlStore::new(pool.clone()));

    authz::register_builtins(&resolver).await.unwrap();
    authz::register_builtins(&resolver).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count as usize, authz::builtin_permissions().len());
}
