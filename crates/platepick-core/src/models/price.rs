use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind, CoreResult};

pub const MAX_PRICE_TIER: u8 = 4;

/// Provider price level, 0 (cheapest or no data) through 4.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PriceTier(u8);

impl PriceTier {
    pub const LOWEST: PriceTier = PriceTier(0);

    pub fn new(level: u8) -> CoreResult<Self> {
        if level > MAX_PRICE_TIER {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("price tier {level} is outside 0..={MAX_PRICE_TIER}"),
            ));
        }
        Ok(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 | 1 => "$ budget",
            2 => "$$ casual",
            3 => "$$$ treat",
            _ => "$$$$ splurge",
        }
    }
}

impl Display for PriceTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order-independent set of accepted tiers. Equality is set equality.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PriceTierSet(BTreeSet<PriceTier>);

impl PriceTierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tier: PriceTier) -> bool {
        self.0.insert(tier)
    }

    pub fn contains(&self, tier: PriceTier) -> bool {
        self.0.contains(&tier)
    }

    /// Places without a price level count as the lowest tier. This is a
    /// content rule: unpriced places are shown to budget searches.
    pub fn accepts(&self, tier: Option<PriceTier>) -> bool {
        self.contains(tier.unwrap_or(PriceTier::LOWEST))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PriceTier> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<PriceTier> for PriceTierSet {
    fn from_iter<I: IntoIterator<Item = PriceTier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for PriceTierSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .iter()
            .map(|tier| tier.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{{{joined}}}")
    }
}

/// Flattens checkbox values into one tier set.
///
/// Each selection may carry a single tier (`"2"`) or several joined by
/// commas (`"0,1"`). An empty selection list yields an empty set, which
/// callers treat as "no filter selected".
pub fn normalize_selections<S: AsRef<str>>(selections: &[S]) -> CoreResult<PriceTierSet> {
    let mut tiers = PriceTierSet::new();
    for selection in selections {
        for raw in selection.as_ref().split(',') {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let level = trimmed.parse::<u8>().map_err(|error| {
                CoreError::new(
                    CoreErrorKind::InvalidInput,
                    format!("invalid price tier '{trimmed}': {error}"),
                )
            })?;
            tiers.insert(PriceTier::new(level)?);
        }
    }
    Ok(tiers)
}
