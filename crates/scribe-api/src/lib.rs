pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod pagination;
pub mod posts;
pub mod render;
pub mod state;
pub mod views;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// All application routes. Transport layers (tracing, CORS) are added by the binary.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/create/", get(posts::create_form).post(posts::create_post))
        .route("/posts/{post_id}/edit/", get(posts::edit_form).post(posts::edit_post))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_login));

    let public_routes = Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", get(auth::login_page).post(auth::login))
        .route("/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
