//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Mean Haversine distance from a point to every point in a cluster, in km.
///
/// Returns 0.0 for an empty cluster so a candidate always "fits" an empty
/// bucket during day distribution.
pub fn mean_distance(point: &Coordinates, cluster: &[Coordinates]) -> f64 {
    if cluster.is_empty() {
        return 0.0;
    }

    let total: f64 = cluster
        .iter()
        .map(|other| haversine_distance(point, other))
        .sum();

    total / cluster.len() as f64
}
