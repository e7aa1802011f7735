use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{self, PermissionResolver, SqlStore};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{health, permissions};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub resolver: PermissionResolver<SqlStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        let resolver = PermissionResolver::new(SqlStore::new(pool.clone()));
        Self {
            pool,
            jwt: Arc::new(jwt),
            resolver,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config);

    // Built-in gates are declared on every boot; admin-configured grants
    // survive because registration never touches grant rows.
    authz::register_builtins(&state.resolver).await?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let permission_routes = Router::new()
        .route("/", get(permissions::list_permissions))
        .route("/:code", get(permissions::self_has_permission));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .route("/me/admin", get(permissions::self_is_admin))
        .nest("/permissions", permission_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
