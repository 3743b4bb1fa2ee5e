//! Great-circle geo primitives.
//!
//! Distances are computed with the haversine formula; this crate never
//! touches a road network (see Non-goals) so travel time is always a
//! straight-line estimate at a configured average speed.

/// Mean Earth radius in kilometers (matches the reference implementation's
/// constant, not the coarser 6371.0 sometimes used for quick estimates).
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A (latitude, longitude) point in degrees.
pub type Point = (f64, f64);

/// Error returned by [`travel_time_minutes`].
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// `speed_kmph` was zero or negative.
    InvalidSpeed(f64),
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::InvalidSpeed(speed) => write!(f, "speed_kmph must be positive, got {}", speed),
        }
    }
}

impl std::error::Error for GeoError {}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(origin: Point, destination: Point) -> f64 {
    let (lat1, lon1) = origin;
    let (lat2, lon2) = destination;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Convert a distance in kilometers to travel time in minutes at a constant
/// average speed. Returns `0.0` for non-positive distances; fails for
/// non-positive speeds.
pub fn travel_time_minutes(distance_km: f64, speed_kmph: f64) -> Result<f64, GeoError> {
    if speed_kmph <= 0.0 {
        return Err(GeoError::InvalidSpeed(speed_kmph));
    }
    if distance_km <= 0.0 {
        return Ok(0.0);
    }
    Ok((distance_km / speed_kmph) * 60.0)
}
