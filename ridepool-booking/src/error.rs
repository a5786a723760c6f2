use ridepool_domain::BookingStatus;

/// What an actor asks the lifecycle manager to do with an open booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Accept,
    Reject,
    Cancel,
}

impl BookingAction {
    /// Parse the action token from a request body.
    pub fn parse(token: &str) -> Result<Self, BookingError> {
        match token.to_ascii_lowercase().as_str() {
            "accept" => Ok(BookingAction::Accept),
            "reject" => Ok(BookingAction::Reject),
            "cancel" => Ok(BookingAction::Cancel),
            other => Err(BookingError::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not enough seats available: requested {requested}, available {available}")]
    CapacityExceeded { requested: i32, available: i32 },

    #[error("Cannot modify booking with status: {0:?}")]
    InvalidState(BookingStatus),

    #[error("Invalid action: {0}. Must be 'accept', 'reject', or 'cancel'")]
    InvalidAction(String),

    #[error("Seats requested must be at least 1, got {0}")]
    InvalidSeatCount(i32),

    #[error("Storage error: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}
