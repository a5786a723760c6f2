pub mod events;
pub mod pii;

pub use events::{LocationUpdateEvent, NotificationEvent};
pub use pii::Masked;
