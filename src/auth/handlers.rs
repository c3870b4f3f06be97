use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{MessageResponse, PublicUser, SigninRequest, SigninResponse, SignupRequest},
        services::{authenticate, register, validate_signin, validate_signup},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// A body that is absent or not a JSON object is treated like one with no
/// fields, so it gets the same 400 as a missing field.
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Option<Json<SignupRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let expose = state.config.expose_db_errors;
    let req = payload.map(|Json(p)| p).unwrap_or_default();

    let reg = validate_signup(req).map_err(|e| ApiError::from_auth(e, expose))?;
    let user = register(state.store.as_ref(), reg)
        .await
        .map_err(|e| ApiError::from_auth(e, expose))?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(MessageResponse {
        message: "User registered successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    payload: Option<Json<SigninRequest>>,
) -> Result<Json<SigninResponse>, ApiError> {
    let expose = state.config.expose_db_errors;
    let req = payload.map(|Json(p)| p).unwrap_or_default();

    let creds = validate_signin(req).map_err(|e| ApiError::from_auth(e, expose))?;
    let user = authenticate(state.store.as_ref(), creds)
        .await
        .map_err(|e| ApiError::from_auth(e, expose))?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(SigninResponse {
        message: "Login successful",
        user: PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}
