use std::time::Duration;

use tokio::time::Instant;

use crate::models::{Location, Place, PriceTierSet};

#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub results: Vec<Place>,
    pub captured_at: Instant,
    pub location: Location,
    pub tiers: PriceTierSet,
}

/// Holds the result set of the last successful search.
///
/// There is only ever one current location and filter pair, so the cache
/// keeps at most one entry and replaces it wholesale on every store.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn lookup(&self, location: &Location, tiers: &PriceTierSet) -> Option<&[Place]> {
        self.lookup_at(location, tiers, Instant::now())
    }

    pub fn lookup_at(
        &self,
        location: &Location,
        tiers: &PriceTierSet,
        now: Instant,
    ) -> Option<&[Place]> {
        let Some(entry) = self.entry.as_ref() else {
            tracing::debug!("result cache empty");
            return None;
        };

        let age = now.saturating_duration_since(entry.captured_at);
        if age >= self.ttl {
            tracing::debug!(age_ms = age.as_millis() as u64, "result cache entry expired");
            return None;
        }
        if entry.location != *location {
            tracing::debug!(
                cached = ?entry.location,
                requested = ?location,
                "result cache location mismatch"
            );
            return None;
        }
        if entry.tiers != *tiers {
            tracing::debug!(
                cached = %entry.tiers,
                requested = %tiers,
                "result cache tier mismatch"
            );
            return None;
        }

        Some(entry.results.as_slice())
    }

    pub fn store(&mut self, location: Location, tiers: PriceTierSet, results: Vec<Place>) {
        self.store_at(location, tiers, results, Instant::now());
    }

    pub fn store_at(
        &mut self,
        location: Location,
        tiers: PriceTierSet,
        results: Vec<Place>,
        captured_at: Instant,
    ) {
        tracing::debug!(
            count = results.len(),
            tiers = %tiers,
            "storing result cache entry"
        );
        self.entry = Some(CacheEntry {
            results,
            captured_at,
            location,
            tiers,
        });
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!("result cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::ResultCache;
    use crate::models::{Location, Place, PriceTier, PriceTierSet};

    const TTL: Duration = Duration::from_secs(300);

    fn tiers(levels: &[u8]) -> PriceTierSet {
        levels
            .iter()
            .map(|level| PriceTier::new(*level).unwrap())
            .collect()
    }

    fn place(id: &str) -> Place {
        Place {
            id: id.to_string(),
            name: format!("Place {id}"),
            price_tier: Some(PriceTier::new(1).unwrap()),
            rating: Some(4.2),
            rating_count: Some(120),
            location: Location::new(25.0335, 121.5650),
        }
    }

    fn taipei() -> Location {
        Location::new(25.0330, 121.5654)
    }

    #[test]
    fn matching_entry_within_ttl_is_a_hit() {
        let start = Instant::now();
        let mut cache = ResultCache::new(TTL);
        cache.store_at(taipei(), tiers(&[1, 2]), vec![place("a"), place("b")], start);

        let hit = cache
            .lookup_at(&taipei(), &tiers(&[2, 1]), start + Duration::from_secs(299))
            .unwrap();
        assert_eq!(hit.len(), 2);
        assert_eq!(hit[0].id, "a");
    }

    fn tiers_from_mask(mask: u8) -> PriceTierSet {
        let levels: Vec<u8> = (0..=4).filter(|level| mask & (1u8 << *level) != 0).collect();
        tiers(&levels)
    }

    #[test]
    fn disjoint_tier_sets_always_miss() {
        let start = Instant::now();
        let mut checked = 0;

        for stored in 1u8..32 {
            for requested in 1u8..32 {
                if stored & requested != 0 {
                    continue;
                }
                let mut cache = ResultCache::new(TTL);
                cache.store_at(taipei(), tiers_from_mask(stored), vec![place("a")], start);

                assert!(
                    cache
                        .lookup_at(&taipei(), &tiers_from_mask(requested), start)
                        .is_none(),
                    "stored {} should not serve {}",
                    tiers_from_mask(stored),
                    tiers_from_mask(requested)
                );
                checked += 1;
            }
        }

        // Ordered pairs of non-empty disjoint subsets of five tiers: 3^5 - 2 * 2^5 + 1.
        assert_eq!(checked, 180);
    }

    #[test]
    fn overlapping_but_unequal_tier_sets_miss() {
        let start = Instant::now();
        let mut cache = ResultCache::new(TTL);
        cache.store_at(taipei(), tiers(&[1, 2]), vec![place("a")], start);

        assert!(cache.lookup_at(&taipei(), &tiers(&[1]), start).is_none());
        assert!(cache.lookup_at(&taipei(), &tiers(&[1, 2, 3]), start).is_none());
    }

    #[test]
    fn any_latitude_change_misses() {
        let start = Instant::now();
        let mut cache = ResultCache::new(TTL);
        cache.store_at(taipei(), tiers(&[1]), vec![place("a")], start);

        let nudged = Location::new(taipei().lat + 1e-9, taipei().lng);
        assert!(cache.lookup_at(&nudged, &tiers(&[1]), start).is_none());
    }

    #[test]
    fn entry_at_or_past_ttl_is_never_returned() {
        let start = Instant::now();
        let mut cache = ResultCache::new(TTL);
        cache.store_at(taipei(), tiers(&[1]), vec![place("a")], start);

        assert_eq!(cache.ttl(), TTL);
        assert!(
            cache
                .lookup_at(&taipei(), &tiers(&[1]), start + TTL - Duration::from_millis(1))
                .is_some()
        );
        assert!(cache.lookup_at(&taipei(), &tiers(&[1]), start + cache.ttl()).is_none());
        assert!(
            cache
                .lookup_at(&taipei(), &tiers(&[1]), start + TTL + Duration::from_secs(60))
                .is_none()
        );
    }

    #[test]
    fn store_replaces_previous_entry_wholesale() {
        let start = Instant::now();
        let mut cache = ResultCache::new(TTL);
        cache.store_at(taipei(), tiers(&[1]), vec![place("a"), place("b")], start);
        cache.store_at(taipei(), tiers(&[2]), vec![place("c")], start);

        assert!(cache.lookup_at(&taipei(), &tiers(&[1]), start).is_none());
        let hit = cache.lookup_at(&taipei(), &tiers(&[2]), start).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].id, "c");
    }

    #[test]
    fn invalidate_clears_the_entry() {
        let start = Instant::now();
        let mut cache = ResultCache::new(TTL);
        cache.store_at(taipei(), tiers(&[1]), vec![place("a")], start);
        cache.invalidate();

        assert!(cache.entry().is_none());
        assert!(cache.lookup_at(&taipei(), &tiers(&[1]), start).is_none());
    }
}
