//! REST API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::types::{
    ErrorResponse, NavigationResponse, ProfileResponse, SignInRequest, SignInResponse,
};
use crate::error::GateError;
use crate::gate::NavigationWatch;
use crate::session::{ProfileCache, SessionControl};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub navigation: NavigationWatch,
    pub control: Arc<dyn SessionControl>,
    pub profiles: Arc<ProfileCache>,
}

impl AppState {
    pub fn new(
        navigation: NavigationWatch,
        control: Arc<dyn SessionControl>,
        profiles: Arc<ProfileCache>,
    ) -> Self {
        Self {
            navigation,
            control,
            profiles,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: GateError) -> ApiError {
    match e {
        GateError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::invalid_credentials()),
        ),
        GateError::NotSignedIn => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::not_authenticated()),
        ),
        GateError::Provider { status, message } => (
            StatusCode::BAD_GATEWAY,
            Json(
                ErrorResponse::provider_error(message)
                    .with_details(format!("upstream status {status}")),
            ),
        ),
        GateError::Http(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::provider_error(e.to_string())),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal_error(other.to_string())),
        ),
    }
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "session-gate",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "mode": state.navigation.mode(),
    }))
}

/// Current navigation mode.
pub async fn get_navigation(State(state): State<AppState>) -> Json<NavigationResponse> {
    Json(NavigationResponse::from_state(&state.navigation.state()))
}

/// Profile of the authenticated user.
pub async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let gate_state = state.navigation.state();
    let user = gate_state.user().cloned().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_authenticated()),
        )
    })?;

    let profile = state.profiles.get(&user.id).map_err(error_response)?;
    Ok(Json(ProfileResponse { user, profile }))
}

/// Sign in with email and password.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let session = state
        .control
        .sign_in(&req.email, &req.password)
        .await
        .map_err(error_response)?;

    Ok(Json(SignInResponse {
        user: session.user,
        expires_at: session.expires_at,
    }))
}

/// Sign out.
pub async fn sign_out(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.control.sign_out().await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
