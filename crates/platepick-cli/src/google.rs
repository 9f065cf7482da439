use std::time::Duration;

use platepick_core::models::{
    CoreError, CoreErrorKind, GeocodedLocation, Location, Place, PriceTier,
};
use platepick_core::providers::{
    GeocodeFuture, GeocodeRequest, Geocoder, NearbySearchFuture, NearbySearchRequest,
    NearbySearchResponse, PlacesProvider, ProviderResult, ProviderStatus,
};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Maps web service client for nearby search and geocoding.
#[derive(Clone)]
pub struct GoogleMapsClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> ProviderResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                "maps API key must not be empty",
            ));
        }

        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn fetch_nearby(&self, request: &NearbySearchRequest) -> ProviderResult<NearbySearchResponse> {
        let url = format!("{}/place/nearbysearch/json", self.base_url);
        let location = format!("{},{}", request.location.lat, request.location.lng);
        let body = self
            .agent
            .get(&url)
            .query("location", &location)
            .query("radius", &request.radius_meters.to_string())
            .query("type", &request.category)
            .query("key", &self.api_key)
            .call()
            .map_err(transport_error)?
            .into_string()
            .map_err(|error| {
                CoreError::new(
                    CoreErrorKind::ProviderUnknown,
                    format!("failed to read nearby search body: {error}"),
                )
            })?;

        parse_nearby_response(&body)
    }

    fn fetch_geocode(&self, request: &GeocodeRequest) -> ProviderResult<GeocodedLocation> {
        let url = format!("{}/geocode/json", self.base_url);
        let mut call = self
            .agent
            .get(&url)
            .query("address", &request.address)
            .query("key", &self.api_key);
        if let Some(region) = &request.region {
            call = call.query("region", region);
        }

        let body = call
            .call()
            .map_err(transport_error)?
            .into_string()
            .map_err(|error| {
                CoreError::new(
                    CoreErrorKind::GeocodeNotFound,
                    format!("failed to read geocode body: {error}"),
                )
            })?;

        parse_geocode_response(&body)
    }
}

impl PlacesProvider for GoogleMapsClient {
    fn nearby_search(&self, request: NearbySearchRequest) -> NearbySearchFuture {
        let client = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || client.fetch_nearby(&request))
                .await
                .map_err(|join_error| {
                    CoreError::new(
                        CoreErrorKind::Internal,
                        format!("nearby search join failure: {join_error}"),
                    )
                })?
        })
    }
}

impl Geocoder for GoogleMapsClient {
    fn geocode(&self, request: GeocodeRequest) -> GeocodeFuture {
        let client = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || client.fetch_geocode(&request))
                .await
                .map_err(|join_error| {
                    CoreError::new(
                        CoreErrorKind::Internal,
                        format!("geocode join failure: {join_error}"),
                    )
                })?
        })
    }
}

pub fn directions_url(place: &Place) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}&destination_place_id={}",
        place.location.lat, place.location.lng, place.id
    )
}

#[derive(Deserialize)]
struct NearbyBody {
    status: String,
    #[serde(default)]
    results: Vec<RawPlace>,
}

#[derive(Deserialize)]
struct RawPlace {
    place_id: String,
    name: String,
    price_level: Option<u8>,
    rating: Option<f32>,
    user_ratings_total: Option<u32>,
    geometry: RawGeometry,
}

#[derive(Deserialize)]
struct GeocodeBody {
    status: String,
    #[serde(default)]
    results: Vec<RawGeocodeResult>,
}

#[derive(Deserialize)]
struct RawGeocodeResult {
    formatted_address: String,
    geometry: RawGeometry,
}

#[derive(Deserialize)]
struct RawGeometry {
    location: RawLatLng,
}

#[derive(Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}

fn parse_nearby_response(body: &str) -> ProviderResult<NearbySearchResponse> {
    let parsed: NearbyBody = serde_json::from_str(body).map_err(|error| {
        CoreError::new(
            CoreErrorKind::ProviderUnknown,
            format!("failed to parse nearby search response: {error}"),
        )
    })?;

    let status = ProviderStatus::from_code(&parsed.status);
    if !status.is_ok() {
        return Ok(NearbySearchResponse::failed(status));
    }

    let places = parsed
        .results
        .into_iter()
        .map(|raw| {
            let price_tier = raw.price_level.and_then(|level| {
                PriceTier::new(level)
                    .map_err(|error| {
                        tracing::debug!(place = %raw.name, message = %error.message, "ignoring price level");
                    })
                    .ok()
            });
            Place {
                id: raw.place_id,
                name: raw.name,
                price_tier,
                rating: raw.rating,
                rating_count: raw.user_ratings_total,
                location: Location::new(raw.geometry.location.lat, raw.geometry.location.lng),
            }
        })
        .collect();

    Ok(NearbySearchResponse { status, places })
}

fn parse_geocode_response(body: &str) -> ProviderResult<GeocodedLocation> {
    let parsed: GeocodeBody = serde_json::from_str(body).map_err(|error| {
        CoreError::new(
            CoreErrorKind::GeocodeNotFound,
            format!("failed to parse geocode response: {error}"),
        )
    })?;

    if parsed.status != "OK" {
        return Err(CoreError::new(
            CoreErrorKind::GeocodeNotFound,
            format!("geocoder returned status '{}'", parsed.status),
        ));
    }

    let first = parsed.results.into_iter().next().ok_or_else(|| {
        CoreError::new(CoreErrorKind::GeocodeNotFound, "geocoder returned no results")
    })?;

    Ok(GeocodedLocation {
        location: Location::new(first.geometry.location.lat, first.geometry.location.lng),
        formatted_address: first.formatted_address,
    })
}

fn transport_error(error: ureq::Error) -> CoreError {
    match error {
        ureq::Error::Status(code, _) => CoreError::new(
            CoreErrorKind::ProviderUnknown,
            format!("maps service responded with HTTP {code}"),
        ),
        ureq::Error::Transport(transport) => CoreError::new(
            CoreErrorKind::ProviderUnknown,
            format!("maps service unreachable: {transport}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use platepick_core::models::{CoreErrorKind, Location, PriceTier};
    use platepick_core::providers::ProviderStatus;

    use super::{GoogleMapsClient, directions_url, parse_geocode_response, parse_nearby_response};

    const NEARBY_FIXTURE: &str = r#"{
        "html_attributions": [],
        "results": [
            {
                "place_id": "ChIJ-dintaifung",
                "name": "Din Tai Fung Xinyi",
                "price_level": 2,
                "rating": 4.4,
                "user_ratings_total": 9812,
                "geometry": { "location": { "lat": 25.0334, "lng": 121.5645 } }
            },
            {
                "place_id": "ChIJ-night-market",
                "name": "Tonghua Night Market Stall",
                "geometry": { "location": { "lat": 25.0301, "lng": 121.5530 } }
            }
        ],
        "status": "OK"
    }"#;

    const GEOCODE_FIXTURE: &str = r#"{
        "results": [
            {
                "formatted_address": "No. 7, Section 5, Xinyi Road, Xinyi District, Taipei City, Taiwan 110",
                "geometry": { "location": { "lat": 25.0339639, "lng": 121.5644722 } }
            }
        ],
        "status": "OK"
    }"#;

    #[test]
    fn nearby_results_map_to_places() {
        let response = parse_nearby_response(NEARBY_FIXTURE).unwrap();
        assert_eq!(response.status, ProviderStatus::Ok);
        assert_eq!(response.places.len(), 2);

        let first = &response.places[0];
        assert_eq!(first.id, "ChIJ-dintaifung");
        assert_eq!(first.price_tier, Some(PriceTier::new(2).unwrap()));
        assert_eq!(first.price_tier.map(PriceTier::level), Some(2));
        assert_eq!(first.rating_count, Some(9812));
        assert_eq!(first.location, Location::new(25.0334, 121.5645));

        let second = &response.places[1];
        assert_eq!(second.price_tier, None);
        assert_eq!(second.rating, None);
    }

    #[test]
    fn non_ok_status_is_returned_without_places() {
        let response =
            parse_nearby_response(r#"{ "results": [], "status": "OVER_QUERY_LIMIT" }"#).unwrap();
        assert_eq!(response.status, ProviderStatus::OverQueryLimit);
        assert!(response.places.is_empty());
    }

    #[test]
    fn garbage_body_is_provider_unknown() {
        let error = parse_nearby_response("<html>").unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::ProviderUnknown);
    }

    #[test]
    fn geocode_takes_first_result() {
        let found = parse_geocode_response(GEOCODE_FIXTURE).unwrap();
        assert_eq!(found.location, Location::new(25.0339639, 121.5644722));
        assert!(found.formatted_address.starts_with("No. 7"));
    }

    #[test]
    fn geocode_zero_results_is_not_found() {
        let error =
            parse_geocode_response(r#"{ "results": [], "status": "ZERO_RESULTS" }"#).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::GeocodeNotFound);
    }

    #[test]
    fn directions_link_targets_place() {
        let response = parse_nearby_response(NEARBY_FIXTURE).unwrap();
        assert_eq!(
            directions_url(&response.places[0]),
            "https://www.google.com/maps/dir/?api=1&destination=25.0334,121.5645&destination_place_id=ChIJ-dintaifung"
        );
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let error = GoogleMapsClient::new("  ", super::DEFAULT_BASE_URL).err().unwrap();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }
}
