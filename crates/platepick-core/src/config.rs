use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind, CoreResult};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RADIUS_METERS: u32 = 2000;
pub const DEFAULT_CATEGORY: &str = "restaurant";
pub const DEFAULT_PICK_COUNT: usize = 2;
pub const DEFAULT_NOTICE_DISMISS_SECS: u64 = 5;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub cache_ttl_secs: u64,
    pub search_timeout_secs: u64,
    pub radius_meters: u32,
    pub category: String,
    pub pick_count: usize,
    pub notice_dismiss_secs: u64,
    pub geocode_region: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            radius_meters: DEFAULT_RADIUS_METERS,
            category: DEFAULT_CATEGORY.to_string(),
            pick_count: DEFAULT_PICK_COUNT,
            notice_dismiss_secs: DEFAULT_NOTICE_DISMISS_SECS,
            geocode_region: Some("tw".to_string()),
        }
    }
}

impl SearchConfig {
    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|error| {
            CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("failed to parse search config: {error}"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.search_timeout_secs == 0 {
            return Err(invalid_config("search_timeout_secs must be greater than zero"));
        }
        if self.radius_meters == 0 {
            return Err(invalid_config("radius_meters must be greater than zero"));
        }
        if self.category.trim().is_empty() {
            return Err(invalid_config("category must not be empty"));
        }
        if self.pick_count == 0 {
            return Err(invalid_config("pick_count must be greater than zero"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn notice_dismiss_after(&self) -> Duration {
        Duration::from_secs(self.notice_dismiss_secs)
    }
}

fn invalid_config(message: &str) -> CoreError {
    CoreError::new(CoreErrorKind::InvalidInput, message)
}
