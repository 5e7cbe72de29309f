//! Great-circle distance and flat-earth stepping helpers.

/// Mean Earth radius used for all distance math, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Linear approximation of one degree of latitude, in kilometers.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Haversine distance in kilometers between two coordinates given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Moves a coordinate `distance_km` along `heading_deg` (0 = north, 90 = east).
///
/// Uses the fixed 111 km/degree approximation with the longitude step scaled by
/// cos(latitude). Good enough for the sub-kilometer steps of synthetic tracks.
pub fn step_towards(lat: f64, lon: f64, heading_deg: f64, distance_km: f64) -> (f64, f64) {
    let heading = heading_deg.to_radians();
    let dlat = distance_km * heading.cos() / KM_PER_DEGREE;
    let lon_scale = lat.to_radians().cos().abs().max(1e-6);
    let dlon = distance_km * heading.sin() / (KM_PER_DEGREE * lon_scale);
    (lat + dlat, lon + dlon)
}
