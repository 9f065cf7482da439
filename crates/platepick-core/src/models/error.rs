use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    NeedsLocation,
    ProviderUnavailable,
    NoFilterSelected,
    NoMatch,
    Timeout,
    UserCancelled,
    ProviderZeroResults,
    ProviderQuotaExceeded,
    ProviderRequestDenied,
    ProviderMalformedRequest,
    ProviderUnknown,
    GeocodeNotFound,
    AddressRequired,
    NothingToReroll,
    SearchInFlight,
    InvalidInput,
    Internal,
}

/// Every failure the core reports. None of them are fatal: each one is
/// recoverable by retrying, adjusting the filter, or entering a location.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
