//! Geospatial proximity math.
//!
//! Pure functions only: great-circle distance via the haversine formula and
//! a radius filter over arbitrary items. Coordinate validation is strict --
//! out-of-range or non-finite values are rejected, never clamped.

use crate::error::CoreError;

/// Mean Earth radius in kilometers, per IUGG.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A (longitude, latitude) point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Validate that both components are finite and in range
    /// (longitude in [-180, 180], latitude in [-90, 90]).
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.longitude.is_finite() || !self.latitude.is_finite() {
            return Err(CoreError::InvalidCoordinates(format!(
                "Coordinates must be finite numbers, got ({}, {})",
                self.longitude, self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::InvalidCoordinates(format!(
                "Longitude must be in [-180, 180], got {}",
                self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::InvalidCoordinates(format!(
                "Latitude must be in [-90, 90], got {}",
                self.latitude
            )));
        }
        Ok(())
    }
}

/// Great-circle distance between two validated points, in kilometers.
///
/// Symmetric, and zero iff both points are equal. Inputs are assumed to be
/// range-validated via [`Coordinates::validate`].
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Filter `candidates` to those within `radius_km` of `center`, pairing each
/// kept item with its computed distance.
///
/// Ordering of the result is not guaranteed; callers apply an explicit sort.
pub fn within_radius<T, F>(
    center: Coordinates,
    radius_km: f64,
    candidates: Vec<T>,
    coords_of: F,
) -> Vec<(T, f64)>
where
    F: Fn(&T) -> Coordinates,
{
    candidates
        .into_iter()
        .filter_map(|item| {
            let d = distance_km(center, coords_of(&item));
            (d <= radius_km).then_some((item, d))
        })
        .collect()
}
