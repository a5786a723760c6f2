use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use ridepool_domain::{UserProfile, UserRepository};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    name: String,
    phone: String,
    #[serde(default)]
    rating: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/users/{user_id}", get(get_user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }

    let user = UserProfile::new(req.name, req.phone, req.rating);
    state
        .store
        .create_user(&user)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(user_id = %user.id, "user created");

    Ok(Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
