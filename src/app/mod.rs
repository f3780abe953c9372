//! 应用层

use axum::{middleware, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::core::{
    error::{not_found_fallback, panic_response},
    middleware::request_logging_middleware,
};

pub mod users;

use users::handler::{self, AppState};

/// 创建路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::list_users))
        .route("/add", get(handler::add_form).post(handler::add_user))
        .route("/view/:id", get(handler::view_user))
        .route(
            "/update/:id",
            get(handler::edit_form).post(handler::update_user),
        )
        .route("/delete/:id", get(handler::delete_user))
        .route("/search", get(handler::search_users))
        .route("/health", get(handler::health_check))
        .fallback(not_found_fallback)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}
