//! Permission check endpoints
//!
//! Thin consumers of the authorization core: a self check for feature
//! gating, the admin-flag probe, and a guarded listing of registered
//! permission definitions.

use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::authz;
use crate::db::row_parsers::permission_from_row;
use crate::errors::AppError;
use crate::jwt::AuthEmployee;
use crate::models::permission::Permission;

/// Check whether the calling employee holds a permission
///
/// Returns the resolved boolean; unknown codes resolve to `false` unless
/// the caller is an admin.
#[utoipa::path(
    get,
    path = "/permissions/{code}",
    tag = "Permissions",
    params(
        ("code" = String, Path, description = "Permission code, e.g. reports.export"),
    ),
    responses(
        (status = 200, description = "Whether the caller holds the permission", body = bool),
        (status = 503, description = "Permission store unreachable"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn self_has_permission(
    State(state): State<AppState>,
    auth: AuthEmployee,
    Path(code): Path<String>,
) -> Result<Json<bool>, AppError> {
    let allowed = state.resolver.has_permission(auth.employee_id, &code).await?;
    Ok(Json(allowed))
}

/// Check whether the calling employee is an admin
#[utoipa::path(
    get,
    path = "/me/admin",
    tag = "Permissions",
    responses(
        (status = 200, description = "Whether the caller carries the admin flag", body = bool),
        (status = 503, description = "Permission store unreachable"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn self_is_admin(
    State(state): State<AppState>,
    auth: AuthEmployee,
) -> Result<Json<bool>, AppError> {
    let admin = state.resolver.is_admin(auth.employee_id).await?;
    Ok(Json(admin))
}

/// List registered permission definitions
#[utoipa::path(
    get,
    path = "/permissions",
    tag = "Permissions",
    responses(
        (status = 200, description = "Registered permission definitions", body = Vec<Permission>),
        (status = 403, description = "Caller lacks core.permission.view"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    auth: AuthEmployee,
) -> Result<Json<Vec<Permission>>, AppError> {
    authz::require(&state.resolver, auth.employee_id, authz::codes::PERMISSION_VIEW).await?;

    let rows = sqlx::query(
        "SELECT id, code, title, description, default_access, created_at, updated_at FROM permissions ORDER BY code"
    )
    .fetch_all(&state.pool)
    .await?;

    let permissions = rows
        .iter()
        .map(permission_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(permissions))
}
