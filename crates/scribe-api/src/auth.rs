use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::SaltString,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::info;

use scribe_types::api::{AuthResponse, Claims, LoginQuery, LoginRequest, SignupRequest};

use crate::error::{ApiError, ApiResult};
use crate::render::{Context, render};
use crate::state::AppState;

const TOKEN_TTL_DAYS: i64 = 30;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_username(&req.username)?;
    if req.password.chars().count() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let username = req.username.clone();
    let user_id = state
        .with_store(move |store| match store.create_user(&username, &password_hash) {
            Ok(id) => Ok(Some(id)),
            // Taken usernames hit the UNIQUE constraint.
            Err(e) if scribe_db::is_constraint_violation(&e) => Ok(None),
            Err(e) => Err(e),
        })
        .await?
        .ok_or_else(|| ApiError::Conflict("username is taken".into()))?;

    info!("Registered user {} ({})", req.username, user_id);

    let token = create_token(&state.config.jwt_secret, user_id, &req.username)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            username: req.username,
            token,
            next: None,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = req.username.clone();
    let user = state
        .with_store(move |store| store.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = create_token(&state.config.jwt_secret, user.id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        username: user.username,
        token,
        next: query.next,
    }))
}

/// GET of the login page; `next` is where to go after signing in.
pub async fn login_page(Query(query): Query<LoginQuery>) -> ApiResult<Response> {
    let mut context = Context::new();
    context.insert("next", &query.next)?;
    Ok(render("users/login.html", context))
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Letters, digits and `@.+-_`, 3 to 150 characters.
fn validate_username(username: &str) -> ApiResult<()> {
    let len = username.chars().count();
    if !(3..=150).contains(&len) {
        return Err(ApiError::BadRequest("username must be 3-150 characters".into()));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        return Err(ApiError::BadRequest("username may only contain letters, digits and @.+-_".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_token("secret", 42, "auth").unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "auth");
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("auth").is_ok());
        assert!(validate_username("first.last+tag@host").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }
}
