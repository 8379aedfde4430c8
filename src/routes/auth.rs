use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::error::Result;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = Json<LoginResponse>),
        (status = 400, description = "Empty username or password"),
        (status = 401, description = "Unknown account or wrong password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (token, user) = state
        .auth_service
        .login(&payload.username, &payload.password)?;
    Ok(Json(LoginResponse { token, user }))
}
