//! Great-circle distance on a spherical Earth.

/// Mean Earth radius used by the distance metric, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Returns the haversine distance in kilometers between two coordinates
/// given in degrees.
///
/// Inputs are not range-checked: latitudes outside [-90, 90] or longitudes
/// outside [-180, 180] still produce a finite number.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let r_lat1 = lat1.to_radians();
    let r_lat2 = lat2.to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();

    let a = sin_lat * sin_lat + r_lat1.cos() * r_lat2.cos() * sin_lng * sin_lng;
    // Rounding can push `a` a hair outside [0, 1] near antipodes.
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
