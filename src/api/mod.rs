use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{PrincipalResolver, TokenService};
use crate::config::Config;
use crate::services::{AccountService, BlogService};
use crate::state::SharedState;

mod admins;
pub mod auth;
mod blogs;
mod error;
mod extract;
mod observability;
mod system;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.shared.tokens
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<PrincipalResolver> {
        &self.shared.resolver
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }

    #[must_use]
    pub fn blogs(&self) -> &Arc<dyn BlogService> {
        &self.shared.blog_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/health", get(system::health))
        .route("/users", post(users::register))
        .route("/token", post(auth::user_token))
        .route("/admins/token", post(auth::admin_token))
        .merge(create_user_router(state.clone()))
        .merge(create_admin_router(state.clone()));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(system::root))
        .route("/metrics", get(observability::get_metrics))
        .nest("/api/1", api_router)
        .with_state(state)
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Routes that need a user bearer token.
fn create_user_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/me",
            get(users::get_me).put(users::update_me).delete(users::delete_me),
        )
        .route("/users/me/password", put(users::change_my_password))
        .route("/blogs", post(blogs::create_blog).get(blogs::list_blogs))
        .route(
            "/blogs/{id}",
            get(blogs::get_blog)
                .put(blogs::update_blog)
                .delete(blogs::delete_blog),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_user))
}

/// Routes that need an admin bearer token.
fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/admins",
            post(admins::create_admin).get(admins::list_admins),
        )
        .route(
            "/admins/me",
            get(admins::get_me)
                .put(admins::update_me)
                .delete(admins::delete_me),
        )
        .route("/admins/me/password", put(admins::change_my_password))
        .route("/admins/users", get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
