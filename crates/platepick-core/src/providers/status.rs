use std::fmt::{Display, Formatter};

use crate::models::{CoreError, CoreErrorKind};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    Other(String),
}

impl ProviderStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "OK" => Self::Ok,
            "ZERO_RESULTS" => Self::ZeroResults,
            "OVER_QUERY_LIMIT" => Self::OverQueryLimit,
            "REQUEST_DENIED" => Self::RequestDenied,
            "INVALID_REQUEST" => Self::InvalidRequest,
            "UNKNOWN_ERROR" => Self::UnknownError,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::Other(code) => code.as_str(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn error_kind(&self) -> Option<CoreErrorKind> {
        match self {
            Self::Ok => None,
            Self::ZeroResults => Some(CoreErrorKind::ProviderZeroResults),
            Self::OverQueryLimit => Some(CoreErrorKind::ProviderQuotaExceeded),
            Self::RequestDenied => Some(CoreErrorKind::ProviderRequestDenied),
            Self::InvalidRequest => Some(CoreErrorKind::ProviderMalformedRequest),
            Self::UnknownError | Self::Other(_) => Some(CoreErrorKind::ProviderUnknown),
        }
    }

    pub fn into_error(self) -> Option<CoreError> {
        let kind = self.error_kind()?;
        Some(CoreError::new(
            kind,
            format!("provider returned status '{}'", self.code()),
        ))
    }
}

impl Display for ProviderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ProviderStatus;
    use crate::models::CoreErrorKind;

    #[test]
    fn known_codes_map_to_distinct_kinds() {
        let cases = [
            ("ZERO_RESULTS", CoreErrorKind::ProviderZeroResults),
            ("OVER_QUERY_LIMIT", CoreErrorKind::ProviderQuotaExceeded),
            ("REQUEST_DENIED", CoreErrorKind::ProviderRequestDenied),
            ("INVALID_REQUEST", CoreErrorKind::ProviderMalformedRequest),
            ("UNKNOWN_ERROR", CoreErrorKind::ProviderUnknown),
        ];
        for (code, kind) in cases {
            assert_eq!(ProviderStatus::from_code(code).error_kind(), Some(kind));
        }
    }

    #[test]
    fn unrecognized_code_is_kept_and_treated_as_unknown() {
        let status = ProviderStatus::from_code("NOT_FOUND");
        assert_eq!(status, ProviderStatus::Other("NOT_FOUND".to_string()));
        assert_eq!(status.code(), "NOT_FOUND");

        let error = status.into_error().unwrap();
        assert_eq!(error.kind, CoreErrorKind::ProviderUnknown);
        assert!(error.message.contains("NOT_FOUND"));
    }

    #[test]
    fn ok_is_not_an_error() {
        assert!(ProviderStatus::from_code("OK").into_error().is_none());
    }
}
