//! Uniform random reviewer selection.
//!
//! Picks up to N reviewers from a candidate pool without replacement. The
//! random source is shared by every engine in the process and can be swapped
//! for a seeded generator so tests can assert exact picks.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Reviewers picked when a pull request is created.
pub const MAX_REVIEWERS: usize = 2;

/// Pick up to `max_count` ids from `pool`, skipping anything in `exclude`.
///
/// Duplicate pool entries collapse to their first occurrence. The result is
/// a prefix of a uniform random permutation of the filtered pool, so every
/// eligible candidate is equally likely in every position.
pub fn select<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[String],
    exclude: &[String],
    max_count: usize,
) -> Vec<String> {
    let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut candidates: Vec<String> = pool
        .iter()
        .filter(|id| !excluded.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect();

    if candidates.is_empty() || max_count == 0 {
        return Vec::new();
    }

    candidates.shuffle(rng);
    candidates.truncate(max_count);
    candidates
}

/// Handle to the process-wide random source used for reviewer selection.
///
/// Cloning shares the same generator.
#[derive(Clone)]
pub struct ReviewerSelector {
    rng: Arc<Mutex<StdRng>>,
}

impl ReviewerSelector {
    /// Selector seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Selector with a fixed seed; identical seeds yield identical picks.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// See [`select`].
    pub fn select(&self, pool: &[String], exclude: &[String], max_count: usize) -> Vec<String> {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        select(&mut *rng, pool, exclude, max_count)
    }
}

impl Default for ReviewerSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for ReviewerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewerSelector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_pool_returns_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select(&mut rng, &[], &[], 2).is_empty());
    }

    #[test]
    fn test_fully_excluded_pool_returns_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = ids(&["a", "b"]);
        assert!(select(&mut rng, &pool, &pool, 2).is_empty());
    }

    #[test]
    fn test_caps_at_max_count_without_duplicates() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = ids(&["a", "b", "c", "d", "b"]);
        for _ in 0..50 {
            let picked = select(&mut rng, &pool, &ids(&["a"]), 2);
            assert_eq!(picked.len(), 2);
            assert_ne!(picked[0], picked[1]);
            assert!(!picked.contains(&"a".to_string()));
        }
    }

    #[test]
    fn test_small_pool_returns_everything() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut picked = select(&mut rng, &ids(&["b", "a"]), &[], 5);
        picked.sort();
        assert_eq!(picked, ids(&["a", "b"]));
    }

    #[test]
    fn test_seeded_selectors_agree() {
        let pool = ids(&["a", "b", "c", "d", "e"]);
        let first = ReviewerSelector::seeded(42);
        let second = ReviewerSelector::seeded(42);
        for _ in 0..10 {
            assert_eq!(first.select(&pool, &[], 2), second.select(&pool, &[], 2));
        }
    }

    #[test]
    fn test_matches_shuffle_of_filtered_pool() {
        let pool = ids(&["a", "b", "c", "d"]);
        let selector = ReviewerSelector::seeded(9);

        let mut expected = ids(&["a", "c", "d"]);
        expected.shuffle(&mut StdRng::seed_from_u64(9));
        expected.truncate(2);

        assert_eq!(selector.select(&pool, &ids(&["b"]), 2), expected);
    }

    #[test]
    fn test_roughly_uniform() {
        let pool = ids(&["a", "b", "c"]);
        let selector = ReviewerSelector::seeded(2024);
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..3000 {
            for id in selector.select(&pool, &[], 1) {
                *counts.entry(id).or_default() += 1;
            }
        }
        for id in &pool {
            let n = counts.get(id).copied().unwrap_or(0);
            assert!((800..1200).contains(&n), "{} picked {} times", id, n);
        }
    }
}
