pub mod booking;
pub mod notification;
pub mod repository;
pub mod ride;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use notification::{Notification, NotificationKind};
pub use repository::{
    BookingRepository, NotificationRepository, Notifier, RepoResult, RidePatch, RideRepository,
    UserRepository,
};
pub use ride::{Place, Ride, RideStatus, RideType};
pub use user::UserProfile;
