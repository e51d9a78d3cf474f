use std::{collections::HashSet, hash::Hash};

use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

/// Errors raised while dealing a deck.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    /// The source did not provide enough distinct items for the requested pairs.
    #[error("insufficient source: {requested} distinct items requested, {available} available")]
    InsufficientSource {
        /// Number of pairs requested.
        requested: usize,
        /// Number of distinct items found in the source.
        available: usize,
    },
}

/// Build a shuffled deck holding every item of the first `pair_count` distinct ones twice.
pub fn build_deck<T, R>(items: &[T], pair_count: usize, rng: &mut R) -> Result<Vec<T>, DeckError>
where
    T: Clone + Eq + Hash,
    R: Rng + ?Sized,
{
    build_deck_by(items, pair_count, rng, |item| item.clone())
}

/// Same as [`build_deck`], with distinctness decided on the key returned by `key`.
///
/// The source is expected to be randomised already, so the first distinct items win.
pub fn build_deck_by<T, K, R, F>(
    items: &[T],
    pair_count: usize,
    rng: &mut R,
    key: F,
) -> Result<Vec<T>, DeckError>
where
    T: Clone,
    K: Eq + Hash,
    R: Rng + ?Sized,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(pair_count);
    let picked: Vec<&T> = items
        .iter()
        .filter(|item| seen.insert(key(*item)))
        .take(pair_count)
        .collect();

    if picked.len() < pair_count {
        return Err(DeckError::InsufficientSource {
            requested: pair_count,
            available: picked.len(),
        });
    }

    let mut deck: Vec<T> = picked
        .iter()
        .chain(picked.iter())
        .map(|item| (*item).clone())
        .collect();
    deck.shuffle(rng);

    Ok(deck)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn deck_holds_each_item_twice() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = ["pikachu", "bulbasaur", "charmander", "squirtle", "eevee"];
        let deck = build_deck(&items, 4, &mut rng).unwrap();

        assert_eq!(deck.len(), 8);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for card in &deck {
            *counts.entry(*card).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|count| *count == 2));
        assert!(!counts.contains_key("eevee"));
    }

    #[test]
    fn duplicates_in_source_are_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let items = ["mew", "mew", "ditto", "onix"];
        let deck = build_deck(&items, 3, &mut rng).unwrap();
        assert_eq!(deck.len(), 6);
        assert_eq!(deck.iter().filter(|card| **card == "mew").count(), 2);
    }

    #[test]
    fn insufficient_source_is_reported() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = ["mew", "mew", "ditto"];
        let err = build_deck(&items, 3, &mut rng).unwrap_err();
        assert_eq!(
            err,
            DeckError::InsufficientSource {
                requested: 3,
                available: 2,
            }
        );
    }

    #[test]
    fn zero_pairs_is_an_empty_deck() {
        let mut rng = StdRng::seed_from_u64(3);
        let items: [&str; 0] = [];
        assert!(build_deck(&items, 0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn distinctness_uses_key() {
        let mut rng = StdRng::seed_from_u64(11);
        let items = [(1, "abra"), (2, "abra"), (3, "kadabra")];
        let deck = build_deck_by(&items, 2, &mut rng, |(_, name)| *name).unwrap();
        assert_eq!(deck.len(), 4);
        assert!(deck.iter().all(|(id, _)| *id == 1 || *id == 3));
    }

    #[test]
    fn shuffle_has_no_positional_bias() {
        let mut rng = StdRng::seed_from_u64(2024);
        let items = ["a", "b", "c", "d"];
        let trials = 20_000;
        let len = items.len() * 2;
        let mut hits = vec![0usize; len];

        for _ in 0..trials {
            let deck = build_deck(&items, items.len(), &mut rng).unwrap();
            for (slot, card) in deck.iter().enumerate() {
                if *card == "a" {
                    hits[slot] += 1;
                }
            }
        }

        // "a" fills two of eight slots: expected share per slot is 1/4 of the trials.
        let expected = trials as f64 * 2.0 / len as f64;
        for (slot, count) in hits.iter().enumerate() {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "slot {slot} hit {count} times, expected ~{expected}");
        }
    }
}
