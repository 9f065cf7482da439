use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::models::Place;

/// Random picker behind "choose" and "reroll".
///
/// Every call is an independent draw without replacement: a reroll may
/// return places shown by an earlier call.
pub struct Selector<R: Rng = StdRng> {
    rng: R,
}

impl Selector<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Selector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn choose(&mut self, items: &[Place], count: usize) -> Vec<Place> {
        let amount = count.min(items.len());
        rand::seq::index::sample(&mut self.rng, items.len(), amount)
            .into_iter()
            .map(|index| items[index].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::Selector;
    use crate::models::{Location, Place};

    fn places(count: usize) -> Vec<Place> {
        (0..count)
            .map(|index| Place {
                id: format!("place-{index}"),
                name: format!("Noodle Bar {index}"),
                price_tier: None,
                rating: None,
                rating_count: None,
                location: Location::new(25.0, 121.0 + index as f64 * 0.001),
            })
            .collect()
    }

    fn seeded(seed: u64) -> Selector<StdRng> {
        Selector::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn empty_list_yields_empty_selection() {
        assert!(seeded(7).choose(&[], 2).is_empty());
    }

    #[test]
    fn single_item_list_yields_that_item() {
        let items = places(1);
        let picked = seeded(7).choose(&items, 2);
        assert_eq!(picked, items);
    }

    #[test]
    fn larger_list_yields_two_distinct_members() {
        let items = places(10);
        let mut selector = seeded(11);
        for _ in 0..50 {
            let picked = selector.choose(&items, 2);
            assert_eq!(picked.len(), 2);
            assert_ne!(picked[0].id, picked[1].id);
            assert!(picked.iter().all(|place| items.contains(place)));
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_picks() {
        let items = places(8);
        let mut first = seeded(42);
        let mut second = seeded(42);
        for _ in 0..10 {
            assert_eq!(first.choose(&items, 2), second.choose(&items, 2));
        }
    }

    #[test]
    fn rerolls_can_revisit_earlier_picks() {
        let items = places(3);
        let mut selector = seeded(3);
        let mut seen = HashSet::new();
        let mut repeats = 0;
        for _ in 0..30 {
            for place in selector.choose(&items, 2) {
                if !seen.insert(place.id) {
                    repeats += 1;
                }
            }
        }
        assert_eq!(seen.len(), 3);
        assert!(repeats > 0);
    }
}
