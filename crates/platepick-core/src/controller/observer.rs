use std::time::Duration;

use crate::models::{CoreError, CoreErrorKind, GeolocationFailure, Location, Place};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NoticeKind {
    Failure(CoreErrorKind),
    LocationUpdated,
}

/// Transient message for the rendering side; hosts hide it after
/// `dismiss_after`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub dismiss_after: Duration,
}

/// Rendering collaborator. The controller is its only caller.
pub trait SearchObserver: Send {
    fn picks_ready(&mut self, picks: &[Place]);

    fn busy_changed(&mut self, busy: bool);

    fn notice(&mut self, notice: &Notice);

    fn location_changed(&mut self, _location: &Location, _label: &str) {}
}

/// Observer that drops everything. Useful for headless hosts.
pub struct SilentObserver;

impl SearchObserver for SilentObserver {
    fn picks_ready(&mut self, _picks: &[Place]) {}

    fn busy_changed(&mut self, _busy: bool) {}

    fn notice(&mut self, _notice: &Notice) {}
}

pub fn user_message(kind: CoreErrorKind) -> &'static str {
    match kind {
        CoreErrorKind::NeedsLocation => "Allow location access or enter a location manually",
        CoreErrorKind::ProviderUnavailable => {
            "The places service is not ready yet, try again in a moment"
        }
        CoreErrorKind::NoFilterSelected => "Select at least one price range",
        CoreErrorKind::NoMatch => {
            "No nearby places match these price ranges, try selecting more of them"
        }
        CoreErrorKind::Timeout => "The search timed out, try again later or adjust the filters",
        CoreErrorKind::UserCancelled => "Search cancelled",
        CoreErrorKind::ProviderZeroResults => "No places were found nearby, try again later",
        CoreErrorKind::ProviderQuotaExceeded => "The places quota is used up, try again later",
        CoreErrorKind::ProviderRequestDenied => {
            "The places request was denied, check the API key"
        }
        CoreErrorKind::ProviderMalformedRequest => "The search parameters were rejected",
        CoreErrorKind::ProviderUnknown => "Something went wrong while searching, try again",
        CoreErrorKind::GeocodeNotFound => "That place could not be found, try another address",
        CoreErrorKind::AddressRequired => "Enter a location first",
        CoreErrorKind::NothingToReroll => "Search for places first",
        CoreErrorKind::SearchInFlight => "A search is already running",
        CoreErrorKind::InvalidInput => "That price selection is not valid",
        CoreErrorKind::Internal => "Something went wrong, try again",
    }
}

pub fn geolocation_message(failure: GeolocationFailure) -> &'static str {
    match failure {
        GeolocationFailure::PermissionDenied => {
            "Allow location access or enter a location manually"
        }
        GeolocationFailure::Unavailable => "Your position is unavailable, enter a location manually",
        GeolocationFailure::Timeout => "Locating timed out, enter a location manually",
    }
}

pub(crate) fn failure_notice(error: &CoreError, dismiss_after: Duration) -> Notice {
    Notice {
        kind: NoticeKind::Failure(error.kind),
        message: user_message(error.kind).to_string(),
        dismiss_after,
    }
}
