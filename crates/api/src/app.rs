use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    admin_users, auth, clusters, expirations, graves, health, pictures, relations, requests,
    search,
};
use crate::services::{build_jwt_config, LocalStorage, PictureStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub storage: Arc<dyn PictureStorage>,
}

impl AppState {
    /// Builds state with local-disk picture storage from `config.storage`.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let storage = Arc::new(LocalStorage::new(
            config.storage.upload_dir.clone(),
            config.storage.public_base_url.clone(),
        ));
        Self::with_storage(config, pool, storage)
    }

    pub fn with_storage(
        config: Config,
        pool: PgPool,
        storage: Arc<dyn PictureStorage>,
    ) -> Result<Self, JwtError> {
        let jwt = Arc::new(build_jwt_config(&config.jwt)?);
        let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);
        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt,
            rate_limiter,
            storage,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/clusters", get(clusters::list_clusters))
        .route("/api/v1/clusters/nearby", get(clusters::nearby_clusters))
        .route("/api/v1/clusters/:id", get(clusters::get_cluster))
        .route(
            "/api/v1/clusters/:id/graves",
            get(clusters::list_cluster_graves),
        )
        .route(
            "/api/v1/clusters/:id/instructions",
            get(clusters::get_instructions),
        )
        .route("/api/v1/graves/:id/pictures", get(pictures::list_pictures))
        .route("/api/v1/search/graves", get(search::search_graves));

    // Layers run bottom-up: authentication first, then the per-user budget.
    let user_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route(
            "/api/v1/requests",
            get(requests::list_my_requests).post(requests::create_request),
        )
        .route("/api/v1/requests/:id", get(requests::get_request))
        .route("/api/v1/graves", get(graves::list_graves))
        .route("/api/v1/graves/:id", get(graves::get_grave))
        .route("/api/v1/search", get(search::global_search))
        .route("/api/v1/relations", get(relations::list_my_relations))
        .route("/api/v1/relations/:id", get(relations::get_relation))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    let admin_routes = Router::new()
        .route("/api/v1/admin/clusters", post(clusters::create_cluster))
        .route(
            "/api/v1/admin/clusters/:id",
            patch(clusters::update_cluster).delete(clusters::delete_cluster),
        )
        .route(
            "/api/v1/admin/clusters/:id/instructions",
            put(clusters::upsert_instructions).delete(clusters::delete_instructions),
        )
        .route("/api/v1/admin/graves", post(graves::create_grave))
        .route(
            "/api/v1/admin/graves/:id",
            patch(graves::update_grave).delete(graves::delete_grave),
        )
        .route(
            "/api/v1/admin/graves/:id/pictures",
            post(pictures::upload_picture),
        )
        .route(
            "/api/v1/admin/graves/:id/relations",
            get(relations::list_grave_relations),
        )
        .route("/api/v1/admin/pictures/:id", delete(pictures::delete_picture))
        .route("/api/v1/admin/relations", post(relations::create_relation))
        .route(
            "/api/v1/admin/relations/:id",
            delete(relations::delete_relation),
        )
        .route("/api/v1/admin/requests", get(requests::list_all_requests))
        .route("/api/v1/admin/requests/stats", get(requests::request_stats))
        .route(
            "/api/v1/admin/requests/:id",
            delete(requests::delete_request),
        )
        .route(
            "/api/v1/admin/requests/:id/status",
            put(requests::update_request_status),
        )
        .route(
            "/api/v1/admin/requests/:id/logs",
            post(requests::append_request_log),
        )
        .route("/api/v1/admin/expirations", get(expirations::list_expirations))
        .route("/api/v1/admin/users", get(admin_users::list_users))
        .route(
            "/api/v1/admin/users/:id/ban",
            put(admin_users::ban_user).delete(admin_users::unban_user),
        )
        .route("/api/v1/admin/users/:id/role", put(admin_users::update_role))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes);

    // Uploaded pictures are served directly when exposed under a local path.
    let base_url = config.storage.public_base_url.trim_end_matches('/');
    if base_url.starts_with('/') && base_url.len() > 1 {
        router = router.nest_service(base_url, ServeDir::new(&config.storage.upload_dir));
    }

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
