//! # lexlib-api
//!
//! HTTP server for the lexlib legal library: public browsing and search,
//! authenticated preview and download, and the admin dashboard.
//!
//! [`build_router`] assembles the routes and middleware around an
//! [`AppState`]; the `lexlib-api` binary wires it to the environment.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query_types;
pub mod state;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use config::{BackendKind, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

use handlers::{account, admin, categories, documents, pages};
use middleware::{rate_limit_middleware, request_span, MakeRequestUuidV7};

/// Build the application router with its middleware stack.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let public = Router::new()
        .route("/categories", get(categories::list_categories))
        .route(
            "/categories/:name/subcategories",
            get(categories::list_subcategories),
        )
        .route("/documents", get(documents::list_documents))
        .route("/documents/search", get(documents::search_documents))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id/preview", get(documents::preview_document))
        .route("/documents/:id/download", get(documents::download_document))
        .route("/me", get(account::me))
        .route("/me/login", post(account::record_login))
        .route("/pages/:slug", get(pages::get_page));

    let admin = Router::new()
        .route("/documents", post(admin::upload_documents))
        .route(
            "/documents/:id",
            axum::routing::patch(admin::update_document).delete(admin::delete_document),
        )
        .route("/users", get(admin::list_users))
        .route("/subscriptions", get(admin::list_subscriptions))
        .route(
            "/subscriptions/:id",
            axum::routing::patch(admin::update_subscription),
        )
        .route("/pages", get(admin::list_pages))
        .route(
            "/pages/:slug",
            put(admin::upsert_page).delete(admin::delete_page),
        );

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.origin_headers()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", public.nest("/admin", admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::new())
                .layer(cors),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}
