pub mod coordinate;
pub mod proximity;

pub use coordinate::{haversine_distance_km, Coordinate, CoordinateError};
pub use proximity::{rank_by_proximity, ProximityOptions, Ranked};
