use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub id: Uuid,
    /// Unique machine code, e.g. "reports.export"
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Baseline outcome when no scope records a grant or deny
    pub default_access: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload: the fields a module declares at startup for the
/// permissions it gates behind. See
/// [`PermissionResolver::ensure_registered`](crate::authz::PermissionResolver::ensure_registered).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PermissionData {
    #[schema(example = "reports.export")]
    pub code: String,
    #[schema(example = "Export reports")]
    pub title: String,
    pub description: Option<String>,
    pub default_access: bool,
}

impl PermissionData {
    pub fn new(code: &str, title: &str, default_access: bool) -> Self {
        Self {
            code: code.to_string(),
            title: title.to_string(),
            description: None,
            default_access,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
