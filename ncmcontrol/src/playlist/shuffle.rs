//! Boundary-aware shuffle.
//!
//! A plain shuffle regularly puts the last tracks of one pass at the start
//! of the next one. Here the head of the new order is checked against the
//! tail of the previous order and reshuffled a bounded number of times.

use ncmcatalogue::Track;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::debug;

/// Playlists up to this length get a plain shuffle.
pub const SHORT_PLAYLIST_LEN: usize = 3;
pub const MAX_RESHUFFLES: usize = 10;
const AVOID_RATIO: f64 = 0.4;
const MAX_AVOID: usize = 5;

/// Number of boundary tracks kept apart: `clamp(round(len * 0.4), 1, 5)`.
pub fn avoid_count(len: usize) -> usize {
    ((len as f64 * AVOID_RATIO).round() as usize).clamp(1, MAX_AVOID)
}

/// Shuffles `tracks` in place.
///
/// `previous` is the order of the pass that just ended, if any. Returns
/// `true` when the head of the new order shares no track with the tail of
/// `previous` (always `true` for short playlists or without a previous pass).
pub fn boundary_shuffle<R>(tracks: &mut [Track], previous: Option<&[Track]>, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    tracks.shuffle(rng);

    let len = tracks.len();
    if len <= SHORT_PLAYLIST_LEN {
        return true;
    }

    let avoid = avoid_count(len);
    let tail: HashSet<String> = match previous {
        Some(prev) if !prev.is_empty() => prev
            .iter()
            .skip(prev.len().saturating_sub(avoid))
            .map(|t| t.id.clone())
            .collect(),
        _ => return true,
    };

    let collides = |order: &[Track]| order.iter().take(avoid).any(|t| tail.contains(&t.id));

    let mut retries = 0;
    while collides(tracks) {
        if retries == MAX_RESHUFFLES {
            debug!(len, avoid, "Accepting shuffle with boundary overlap");
            return false;
        }
        tracks.shuffle(rng);
        retries += 1;
    }

    if retries > 0 {
        debug!(len, avoid, retries, "Reshuffled to avoid boundary repetition");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n).map(|i| Track::new(format!("t{i}"), format!("Track {i}"))).collect()
    }

    fn ids(order: &[Track]) -> Vec<String> {
        let mut ids: Vec<String> = order.iter().map(|t| t.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_avoid_count_bounds() {
        assert_eq!(avoid_count(1), 1);
        assert_eq!(avoid_count(4), 2);
        assert_eq!(avoid_count(5), 2);
        assert_eq!(avoid_count(8), 3);
        assert_eq!(avoid_count(10), 4);
        assert_eq!(avoid_count(100), 5);
    }

    #[test]
    fn test_short_playlist_is_plain_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = tracks(3);
        let mut order = original.clone();
        assert!(boundary_shuffle(&mut order, Some(&original), &mut rng));
        assert_eq!(ids(&order), ids(&original));
    }

    #[test]
    fn test_boundary_is_avoided_across_trials() {
        let mut rng = StdRng::seed_from_u64(42);
        let len = 100;
        let avoid = avoid_count(len);
        let mut clean = 0;

        for _ in 0..10 {
            let mut pass_n = tracks(len);
            boundary_shuffle(&mut pass_n, None, &mut rng);
            let mut pass_next = pass_n.clone();
            boundary_shuffle(&mut pass_next, Some(&pass_n), &mut rng);

            let tail: HashSet<_> = pass_n[len - avoid..].iter().map(|t| t.id.clone()).collect();
            if pass_next[..avoid].iter().all(|t| !tail.contains(&t.id)) {
                clean += 1;
            }
            assert_eq!(ids(&pass_next), ids(&pass_n));
        }

        assert!(clean >= 9, "only {clean}/10 passes avoided the boundary");
    }

    #[test]
    fn test_impossible_constraint_terminates() {
        // Avec 4 pistes et 2 à éviter, l'échec reste possible : la fonction
        // doit malgré tout rendre la main.
        let mut rng = StdRng::seed_from_u64(1);
        let previous = tracks(4);
        for _ in 0..50 {
            let mut order = previous.clone();
            boundary_shuffle(&mut order, Some(&previous), &mut rng);
            assert_eq!(order.len(), 4);
        }
    }
}
