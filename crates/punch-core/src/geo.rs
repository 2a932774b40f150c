//! Geofence membership: is a reported location close enough to the office?

use serde::{Deserialize, Serialize};

/// Mean earth radius in metres (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  pub const fn new(latitude: f64, longitude: f64) -> Self {
    Self { latitude, longitude }
  }

  /// Finite and within the valid degree ranges.
  pub fn is_valid(&self) -> bool {
    self.latitude.is_finite()
      && self.longitude.is_finite()
      && (-90.0..=90.0).contains(&self.latitude)
      && (-180.0..=180.0).contains(&self.longitude)
  }
}

/// The office catchment area: a circle around `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfficeGeofence {
  pub center:        Coordinates,
  pub radius_meters: f64,
}

impl OfficeGeofence {
  pub fn contains(&self, point: Coordinates) -> bool {
    is_within_fence(point.latitude, point.longitude, self)
  }
}

/// Great-circle distance between two points, in metres (haversine).
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
  let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
  let d_lat = lat2 - lat1;
  let d_lng = (b.longitude - a.longitude).to_radians();

  let h = (d_lat / 2.0).sin().powi(2)
    + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
  2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Whether `(lat, lng)` lies inside `fence`; the boundary counts as inside.
///
/// Invalid coordinates (NaN, infinities, out-of-range degrees) are never
/// inside the fence. They are logged and otherwise treated like any other
/// location outside the office.
pub fn is_within_fence(lat: f64, lng: f64, fence: &OfficeGeofence) -> bool {
  let point = Coordinates::new(lat, lng);
  if !point.is_valid() {
    tracing::warn!(lat, lng, "rejecting invalid coordinates");
    return false;
  }
  distance_meters(point, fence.center) <= fence.radius_meters
}
