use serde::{Deserialize, Serialize};

use crate::models::{Location, PriceTier};

/// A nearby place as reported by the provider. Never mutated after receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub price_tier: Option<PriceTier>,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
    pub location: Location,
}

impl Place {
    pub fn distance_meters(&self, from: &Location) -> u64 {
        from.distance_meters(&self.location)
    }

    pub fn price_label(&self) -> &'static str {
        self.price_tier.unwrap_or(PriceTier::LOWEST).label()
    }
}
