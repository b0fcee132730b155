use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::auth::verify_token;
use crate::render::found;
use crate::state::AppState;

/// Require a valid bearer token; otherwise redirect to the login page with
/// the requested path as `next`. Valid claims are stored as a request extension.
pub async fn require_login(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .and_then(|auth| verify_token(&state.config.jwt_secret, auth.token()).ok());

    match claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => {
            let path = req.uri().path_and_query().map(|p| p.as_str()).unwrap_or("/");
            debug!("Anonymous request to {}, redirecting to login", path);
            found(&login_redirect(&state.config.login_url, path))
        }
    }
}

pub fn login_redirect(login_url: &str, next: &str) -> String {
    format!("{}?next={}", login_url, urlencoding::encode(next))
}
