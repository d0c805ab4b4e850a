//! Heavy-atom contact detection between ground-truth chain pairs.
//!
//! Only physically interacting interfaces are worth scoring: two chains are
//! in contact iff any heavy atom of one lies within [`CONTACT_DISTANCE`] of
//! any heavy atom of the other.

use crate::chains::ChainProfile;
use rayon::prelude::*;
use rstar::RTree;

/// Inclusive heavy-atom distance threshold in Ångström.
pub const CONTACT_DISTANCE: f64 = 5.0;

/// Whether any atom of one pool is within [`CONTACT_DISTANCE`] of any atom
/// of the other. Symmetric in its arguments; empty pools are never in
/// contact.
pub fn has_contact(a: &[[f64; 3]], b: &[[f64; 3]]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    // Index the smaller pool, probe with the larger
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let tree = RTree::bulk_load(small.to_vec());
    let radius_sq = CONTACT_DISTANCE * CONTACT_DISTANCE;
    large
        .iter()
        .any(|point| tree.locate_within_distance(*point, radius_sq).next().is_some())
}

/// All unordered contacting pairs of ground-truth chains, in the fixed
/// order induced by `order`. Pair checks are independent and evaluated in
/// parallel; the output order never depends on scheduling.
pub fn contacting_pairs(
    order: &[String],
    truth_profiles: &[(String, ChainProfile)],
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for i in 0..order.len() {
        for j in (i + 1)..order.len() {
            pairs.push((order[i].clone(), order[j].clone()));
        }
    }
    pairs
        .into_par_iter()
        .filter(|(i, j)| {
            has_contact(heavy_of(truth_profiles, i), heavy_of(truth_profiles, j))
        })
        .collect()
}

fn heavy_of<'a>(profiles: &'a [(String, ChainProfile)], id: &str) -> &'a [[f64; 3]] {
    profiles
        .iter()
        .find(|(tid, _)| tid == id)
        .map(|(_, p)| p.heavy.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::profile_from_points;

    #[test]
    fn contact_is_symmetric() {
        let a = vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let b = vec![[0.0, 4.0, 0.0]];
        assert!(has_contact(&a, &b));
        assert!(has_contact(&b, &a));
    }

    #[test]
    fn threshold_is_inclusive() {
        let a = vec![[0.0, 0.0, 0.0]];
        let at_cutoff = vec![[5.0, 0.0, 0.0]];
        let beyond = vec![[5.0 + 1e-9, 0.0, 0.0]];
        assert!(has_contact(&a, &at_cutoff));
        assert!(!has_contact(&a, &beyond));
    }

    #[test]
    fn empty_pools_never_touch() {
        let a = vec![[0.0, 0.0, 0.0]];
        assert!(!has_contact(&a, &[]));
        assert!(!has_contact(&[], &a));
        assert!(!has_contact(&[], &[]));
    }

    #[test]
    fn pairs_follow_table_order() {
        // A touches B, C is far from both
        let profiles = vec![
            (
                "A".to_string(),
                profile_from_points("G", &[[0.0, 0.0, 0.0]]),
            ),
            (
                "B".to_string(),
                profile_from_points("G", &[[0.0, 4.0, 0.0]]),
            ),
            (
                "C".to_string(),
                profile_from_points("G", &[[50.0, 0.0, 0.0]]),
            ),
        ];
        let order: Vec<String> = ["B", "A", "C"].iter().map(|s| s.to_string()).collect();
        let pairs = contacting_pairs(&order, &profiles);
        assert_eq!(pairs, vec![("B".to_string(), "A".to_string())]);
    }
}
