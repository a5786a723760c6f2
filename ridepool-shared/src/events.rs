use uuid::Uuid;

/// Pushed on the in-process broadcast channel whenever a notification
/// record is written, so SSE subscribers see it without polling.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NotificationEvent {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub created_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct LocationUpdateEvent {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub updated_at: i64,
}
