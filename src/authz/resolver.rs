use uuid::Uuid;

use crate::models::permission::PermissionData;

use super::store::{GrantStore, HierarchyStore, Scope};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The underlying store could not be read. Retryable; callers must
    /// treat this as "couldn't determine", never as a deny.
    #[error("permission store failure: {0}")]
    Store(#[from] sqlx::Error),
    /// A department ancestor walk exceeded its hop bound: the parent links
    /// form a cycle and the hierarchy data is corrupt.
    #[error("department hierarchy cycle detected at {department_id} after {hops} hops")]
    HierarchyCorruption { department_id: Uuid, hops: u64 },
}

/// Resolves "can employee E perform action P?" against the org hierarchy.
///
/// Resolution order (first recorded answer wins):
/// 1. admin bypass
/// 2. employee-level row
/// 3. position-level row
/// 4. department rows, nearest department first, walking parent links
/// 5. global row
/// 6. the permission's own `default_access`
///
/// Access values: `true` = granted, `false` = denied, no row = inherit
/// from the next broader scope. Presence of a row at any level is terminal
/// regardless of its value, so a narrow deny beats a broad grant.
///
/// Unknown permission codes and unknown employees resolve to `false`
/// (fail-closed); only store failures and hierarchy corruption surface as
/// errors.
#[derive(Debug, Clone)]
pub struct PermissionResolver<S> {
    store: S,
}

impl<S> PermissionResolver<S>
where
    S: HierarchyStore + GrantStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn has_permission(
        &self,
        employee_id: Uuid,
        code: &str,
    ) -> Result<bool, AuthzError> {
        // Admins bypass everything, including the code lookup: an admin is
        // granted even codes that were never registered.
        if self.is_admin(employee_id).await? {
            tracing::debug!(employee_id = %employee_id, permission = %code, "admin bypass");
            return Ok(true);
        }

        let Some(permission) = self.store.permission_by_code(code).await? else {
            tracing::debug!(permission = %code, "unknown permission code, denying");
            return Ok(false);
        };

        if let Some(access) = self
            .store
            .access_at(Scope::Employee(employee_id), permission.id)
            .await?
        {
            tracing::debug!(employee_id = %employee_id, permission = %code, access, "employee-level row");
            return Ok(access);
        }

        let Some(employee) = self.store.employee(employee_id).await? else {
            tracing::debug!(employee_id = %employee_id, "employee not found, denying");
            return Ok(false);
        };

        if let Some(position_id) = employee.position_id {
            if let Some(access) = self
                .store
                .access_at(Scope::Position(position_id), permission.id)
                .await?
            {
                tracing::debug!(position_id = %position_id, permission = %code, access, "position-level row");
                return Ok(access);
            }

            if let Some(position) = self.store.position(position_id).await? {
                if let Some(access) = self
                    .walk_departments(position.department_id, permission.id)
                    .await?
                {
                    return Ok(access);
                }
            }
        }

        if let Some(access) = self.store.access_at(Scope::Global, permission.id).await? {
            tracing::debug!(permission = %code, access, "global row");
            return Ok(access);
        }

        tracing::debug!(
            employee_id = %employee_id,
            permission = %code,
            access = permission.default_access,
            "default access"
        );
        Ok(permission.default_access)
    }

    /// Nearest-first ancestor walk over department parent pointers.
    ///
    /// Bounded by the total department count: an acyclic chain can never
    /// visit more departments than exist, so hitting the bound means the
    /// parent links form a cycle.
    async fn walk_departments(
        &self,
        start: Uuid,
        permission_id: Uuid,
    ) -> Result<Option<bool>, AuthzError> {
        let bound = self.store.department_count().await?.max(1);
        let mut current = Some(start);
        let mut hops = 0u64;

        while let Some(department_id) = current {
            if hops >= bound {
                tracing::error!(department_id = %department_id, hops, "department hierarchy cycle detected");
                return Err(AuthzError::HierarchyCorruption {
                    department_id,
                    hops,
                });
            }

            if let Some(access) = self
                .store
                .access_at(Scope::Department(department_id), permission_id)
                .await?
            {
                tracing::debug!(department_id = %department_id, access, "department-level row");
                return Ok(Some(access));
            }

            current = self
                .store
                .department(department_id)
                .await?
                .and_then(|d| d.parent_id);
            hops += 1;
        }

        Ok(None)
    }

    /// Whether the employee carries the admin flag. A missing employee is
    /// not an admin.
    pub async fn is_admin(&self, employee_id: Uuid) -> Result<bool, AuthzError> {
        let employee = self.store.employee(employee_id).await?;
        Ok(employee.map(|e| e.is_admin).unwrap_or(false))
    }

    /// Register a permission definition, updating title, description and
    /// default access in place when the code already exists. Safe to call
    /// repeatedly and concurrently: the upsert is a single atomic statement
    /// keyed on the unique code, and existing grant rows keep their
    /// permission id.
    pub async fn ensure_registered(&self, data: &PermissionData) -> Result<(), AuthzError> {
        self.store.upsert_permission(data).await?;
        tracing::debug!(code = %data.code, default_access = data.default_access, "permission registered");
        Ok(())
    }
}
