//! crates/care_directory_core/src/geo.rs
//!
//! Great-circle distance between two coordinates using the Haversine formula.

/// Mean Earth radius used by the Haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance reported when either endpoint is unknown, so such records sort last.
pub const UNKNOWN_DISTANCE_KM: f64 = f64::MAX;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point only when both halves are present and finite.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(Self::new(lat, lon))
            }
            _ => None,
        }
    }

    fn is_known(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Distance in kilometres rounded to two decimals.
///
/// Returns [`UNKNOWN_DISTANCE_KM`] when either point is absent or not finite.
pub fn distance_km(from: Option<GeoPoint>, to: Option<GeoPoint>) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) if a.is_known() && b.is_known() => round_to_hundredths(haversine_km(a, b)),
        _ => UNKNOWN_DISTANCE_KM,
    }
}

/// Unrounded Haversine distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Near-antipodal inputs can push h a hair above 1.0 and make the sqrt below NaN.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

// Distances are never negative, so rounding half away from zero is round-half-up here.
fn round_to_hundredths(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}
