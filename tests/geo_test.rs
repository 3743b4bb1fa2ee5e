//! Geo primitive properties (spec invariants 6-7): same-point distance,
//! the canonical one-degree-at-the-equator distance, and invalid-speed
//! failure.

use vrptw_core::geo::{haversine_km, travel_time_minutes};

#[test]
fn same_point_has_zero_distance() {
    assert_eq!(haversine_km((10.0, 123.0), (10.0, 123.0)), 0.0);
}

#[test]
fn one_degree_at_equator_is_about_111_195_km() {
    let km = haversine_km((0.0, 0.0), (0.0, 1.0));
    assert!((km - 111.195).abs() / 111.195 < 0.001, "got {km}");
}

#[test]
fn zero_distance_is_zero_minutes_regardless_of_speed() {
    assert_eq!(travel_time_minutes(0.0, 40.0).unwrap(), 0.0);
}

#[test]
fn nonpositive_speed_fails() {
    assert!(travel_time_minutes(10.0, 0.0).is_err());
    assert!(travel_time_minutes(10.0, -5.0).is_err());
}
