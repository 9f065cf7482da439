pub mod error;
pub mod location;
pub mod place;
pub mod price;

pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use location::{GeocodedLocation, GeolocationFailure, Location};
pub use place::Place;
pub use price::{PriceTier, PriceTierSet, normalize_selections};
