pub mod status;

pub use status::ProviderStatus;

use std::future::Future;
use std::pin::Pin;

use crate::models::{CoreError, GeocodedLocation, Location, Place};

pub type ProviderResult<T> = Result<T, CoreError>;

pub type NearbySearchFuture =
    Pin<Box<dyn Future<Output = ProviderResult<NearbySearchResponse>> + Send>>;

pub type GeocodeFuture = Pin<Box<dyn Future<Output = ProviderResult<GeocodedLocation>> + Send>>;

#[derive(Clone, Debug, PartialEq)]
pub struct NearbySearchRequest {
    pub location: Location,
    pub radius_meters: u32,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NearbySearchResponse {
    pub status: ProviderStatus,
    pub places: Vec<Place>,
}

impl NearbySearchResponse {
    pub fn ok(places: Vec<Place>) -> Self {
        Self {
            status: ProviderStatus::Ok,
            places,
        }
    }

    pub fn failed(status: ProviderStatus) -> Self {
        Self {
            status,
            places: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeocodeRequest {
    pub address: String,
    pub region: Option<String>,
}

/// Nearby-places backend.
///
/// The returned future is driven on the controller's runtime. Dropping
/// interest in it is never required: a reply that arrives after a timeout
/// or cancellation is discarded by the session, not aborted.
pub trait PlacesProvider: Send + Sync {
    fn nearby_search(&self, request: NearbySearchRequest) -> NearbySearchFuture;
}

/// Free-text address resolution used for manual location entry.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, request: GeocodeRequest) -> GeocodeFuture;
}
