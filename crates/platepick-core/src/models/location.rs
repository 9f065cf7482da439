use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A coordinate in degrees.
///
/// Equality is exact: locations always come from a sensor or provider
/// readout, so two readouts either match bit for bit or are different places.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in whole meters.
    pub fn distance_meters(&self, other: &Location) -> u64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        (EARTH_RADIUS_METERS * c).round() as u64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeocodedLocation {
    pub location: Location,
    pub formatted_address: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GeolocationFailure {
    PermissionDenied,
    Unavailable,
    Timeout,
}
