use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use ridepool_domain::{Notification, NotificationRepository};
use serde::Deserialize;
use std::convert::Infallible;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct InboxParams {
    #[serde(default)]
    unread_only: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/notifications/{user_id}", get(list_notifications))
        .route("/v1/notifications/{notification_id}/read", post(mark_read))
        .route(
            "/v1/notifications/{user_id}/stream",
            get(stream_notifications),
        )
}

async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<InboxParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .store
        .list_for_user(user_id, params.unread_only)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(notifications))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let found = state
        .store
        .mark_read(notification_id)
        .await
        .map_err(AppError::internal)?;

    if !found {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Notification marked as read" })))
}

async fn stream_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notification_tx.subscribe();

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |result| {
        async move {
            match result {
                Ok(event) => {
                    if event.user_id == user_id {
                        Some(Ok(Event::default()
                            .event(event.kind.clone())
                            .data(serde_json::to_string(&event).unwrap())))
                    } else {
                        None
                    }
                }
                // Lagged receivers just miss the dropped events.
                Err(_) => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
