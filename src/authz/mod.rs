//! Authorization core - hierarchical permission resolution
//!
//! Answers "can employee E perform action P?" by walking scopes in strict
//! priority order: employee > position > department (nearest first) >
//! global > the permission's default access, with an unconditional admin
//! bypass in front. A recorded row at any scope is terminal, so an
//! explicit deny at a narrow scope always beats a grant at a broader one.

mod resolver;
mod store;

pub use resolver::{AuthzError, PermissionResolver};
pub use store::{GrantStore, HierarchyStore, Scope, SqlStore};

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::permission::PermissionData;

/// Well-known permission codes registered at startup
pub mod codes {
    pub const EMPLOYEE_VIEW: &str = "core.employee.view";
    pub const EMPLOYEE_MANAGE: &str = "core.employee.manage";
    pub const DEPARTMENT_VIEW: &str = "core.department.view";
    pub const DEPARTMENT_MANAGE: &str = "core.department.manage";
    pub const PERMISSION_VIEW: &str = "core.permission.view";
    pub const PERMISSION_MANAGE: &str = "core.permission.manage";
}

/// Built-in permission definitions. `default_access` is only the baseline:
/// administrators override it per scope, and those overrides survive
/// restarts because registration never touches grant rows.
pub fn builtin_permissions() -> Vec<PermissionData> {
    vec![
        PermissionData::new(codes::EMPLOYEE_VIEW, "View employees", true),
        PermissionData::new(codes::EMPLOYEE_MANAGE, "Manage employees", false),
        PermissionData::new(codes::DEPARTMENT_VIEW, "View departments", true),
        PermissionData::new(codes::DEPARTMENT_MANAGE, "Manage departments", false),
        PermissionData::new(codes::PERMISSION_VIEW, "View permission definitions", false)
            .with_description("Read access to registered permission definitions"),
        PermissionData::new(codes::PERMISSION_MANAGE, "Manage permission grants", false),
    ]
}

/// Idempotently declare the built-in permission gates. Extension modules
/// call [`PermissionResolver::ensure_registered`] the same way for their
/// own codes at boot.
pub async fn register_builtins<S>(resolver: &PermissionResolver<S>) -> Result<(), AuthzError>
where
    S: HierarchyStore + GrantStore,
{
    for data in builtin_permissions() {
        resolver.ensure_registered(&data).await?;
    }
    Ok(())
}

/// Authorization guard for route handlers: a denial maps to 403, a store
/// failure to 503.
pub async fn require<S>(
    resolver: &PermissionResolver<S>,
    employee_id: Uuid,
    code: &str,
) -> Result<(), AppError>
where
    S: HierarchyStore + GrantStore,
{
    if resolver.has_permission(employee_id, code).await? {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("missing permission: {code}")))
    }
}
