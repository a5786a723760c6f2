pub mod error;
pub mod service;

pub use error::{BookingAction, BookingError};
pub use service::{BookingService, CreateBooking};
