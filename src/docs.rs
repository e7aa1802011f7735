use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::permissions::self_has_permission,
        routes::permissions::self_is_admin,
        routes::permissions::list_permissions,
    ),
    components(
        schemas(
            models::permission::Permission,
            models::permission::PermissionData,
            models::org::Employee,
            models::org::Position,
            models::org::Department,
            routes::health::HealthResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Permissions", description = "Permission checks and definitions")
    )
)]
struct ApiDoc;

/// Swagger UI plus the OpenAPI document at /api-docs/openapi.json.
pub fn router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
