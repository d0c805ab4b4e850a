//! Anchor-search solver for the ground-truth → predicted chain permutation.
//!
//! One trial is seeded per plausible predicted partner of the anchor
//! ground-truth chain: the anchor pair is rigidly superposed, every
//! ground-truth centroid is carried through that transform, remaining chains
//! are assigned greedily to the nearest unused predicted centroid, and the
//! finished permutation is re-scored with a full Kabsch fit over all chains.
//! The trial with the smallest global deviation wins, first minimum on ties.
//!
//! The greedy step is a heuristic, not a min-cost matching; the global
//! re-score over all anchor trials is what disambiguates symmetric
//! multi-copy complexes. Keep the two-level structure intact.

use crate::chains::ChainProfile;
use crate::correspondence::CandidateTable;
use crate::error::{ChainMapError, Result};
use crate::superpose::{apply_transform, kabsch_rmsd, masked_rows, optimal_transform};
use nalgebra as na;
use polars::prelude::*;
use rayon::prelude::*;
use tracing::debug;

/// The selected bijection from ground-truth chains onto predicted chains.
#[derive(Debug, Clone)]
pub struct ChainAssignment {
    /// `(truth id, predicted id)` pairs in table (anchor-priority) order
    pub pairs: Vec<(String, String)>,
    /// Global Kabsch deviation over all chains under this assignment
    pub global_rmsd: f64,
    /// Number of anchor trials attempted
    pub trials: usize,
}

impl ChainAssignment {
    /// The predicted chain assigned to a ground-truth chain.
    pub fn pred_of(&self, truth_id: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(t, _)| t == truth_id)
            .map(|(_, p)| p.as_str())
    }

    /// Ground-truth chain ids in assignment order.
    pub fn truth_order(&self) -> Vec<String> {
        self.pairs.iter().map(|(t, _)| t.clone()).collect()
    }

    /// The final match table for the reporting sink.
    pub fn to_dataframe(&self) -> DataFrame {
        df!(
            "truth_cid" => self.pairs.iter().map(|(t, _)| t.clone()).collect::<Vec<String>>(),
            "pred_cid" => self.pairs.iter().map(|(_, p)| p.clone()).collect::<Vec<String>>(),
        )
        .unwrap()
    }
}

/// Centroid of the masked rows; the mask is implicitly zero-padded when the
/// coordinate set is longer. Zero selected rows degenerate to the origin.
fn masked_centroid(coords: &na::MatrixXx3<f64>, mask: &[bool]) -> na::RowVector3<f64> {
    let selected = masked_rows(coords, mask);
    if selected.nrows() == 0 {
        na::RowVector3::zeros()
    } else {
        selected.row_mean()
    }
}

struct Trial {
    permutation: Vec<usize>,
    rmsd: f64,
}

fn profile_of<'a>(profiles: &'a [(String, ChainProfile)], id: &str) -> &'a ChainProfile {
    &profiles
        .iter()
        .find(|(pid, _)| pid == id)
        .expect("candidate table references unknown chain")
        .1
}

/// Solve for the permutation minimizing the global aligned deviation.
///
/// `pred_profiles` must be in predicted-chain file order; `truth_profiles`
/// are looked up by the relabeled ids in the candidate table.
pub fn solve(
    table: &CandidateTable,
    pred_profiles: &[(String, ChainProfile)],
    truth_profiles: &[(String, ChainProfile)],
) -> Result<ChainAssignment> {
    let anchor = match table.rows.first() {
        Some(row) => row,
        None => return Err(ChainMapError::EmptyComplex),
    };
    if anchor.candidates.is_empty() {
        return Err(ChainMapError::NoAnchorCandidates(anchor.truth_id.clone()));
    }

    let order = table.truth_order();
    let truths: Vec<&ChainProfile> = order
        .iter()
        .map(|id| profile_of(truth_profiles, id))
        .collect();

    // Eligibility and centroid of every (predicted, truth) pairing is
    // independent of the anchor trial, so the whole matrix is built once.
    // Ineligible pairings carry no distance at all and can never win the
    // greedy minimum.
    let pred_centroids: Vec<Vec<Option<na::RowVector3<f64>>>> = pred_profiles
        .iter()
        .map(|(pred_id, pred)| {
            order
                .iter()
                .zip(&truths)
                .map(|(truth_id, truth)| {
                    table
                        .candidates_of(truth_id)
                        .contains(pred_id)
                        .then(|| masked_centroid(&pred.ca, &truth.mask))
                })
                .collect()
        })
        .collect();

    let anchor_truth = profile_of(truth_profiles, &anchor.truth_id);

    // Anchor trials are independent and read-only; the winner is still
    // picked by a stable fold over trial order below.
    let trials: Vec<Trial> = anchor
        .candidates
        .par_iter()
        .map(|anchor_pred| {
            run_trial(
                anchor_pred,
                anchor_truth,
                &truths,
                pred_profiles,
                &pred_centroids,
            )
        })
        .collect::<Result<_>>()?;

    let mut best: Option<&Trial> = None;
    for (anchor_pred, trial) in anchor.candidates.iter().zip(&trials) {
        debug!(
            anchor_truth = %anchor.truth_id,
            anchor_pred = %anchor_pred,
            rmsd = trial.rmsd,
            permutation = ?trial.permutation,
            "anchor trial"
        );
        if best.is_none_or(|b| trial.rmsd < b.rmsd) {
            best = Some(trial);
        }
    }
    let best = best.expect("at least one anchor trial ran");

    let pairs: Vec<(String, String)> = order
        .iter()
        .zip(&best.permutation)
        .map(|(truth_id, &k)| (truth_id.clone(), pred_profiles[k].0.clone()))
        .collect();

    for (truth_id, pred_id) in &pairs {
        let candidates = table.candidates_of(truth_id);
        if !candidates.is_empty() && !candidates.contains(pred_id) {
            return Err(ChainMapError::IneligibleAssignment {
                truth_id: truth_id.clone(),
                pred_id: pred_id.clone(),
            });
        }
    }

    Ok(ChainAssignment {
        pairs,
        global_rmsd: best.rmsd,
        trials: trials.len(),
    })
}

fn run_trial(
    anchor_pred: &str,
    anchor_truth: &ChainProfile,
    truths: &[&ChainProfile],
    pred_profiles: &[(String, ChainProfile)],
    pred_centroids: &[Vec<Option<na::RowVector3<f64>>>],
) -> Result<Trial> {
    let anchor_ca = &profile_of(pred_profiles, anchor_pred).ca;
    let anchor_len = anchor_truth.mask.len();
    if anchor_ca.nrows() < anchor_len {
        return Err(ChainMapError::ShapeMismatch {
            expected: anchor_len,
            found: anchor_ca.nrows(),
        });
    }

    // Superpose the anchor truth chain onto its candidate's prefix, then
    // carry every truth centroid through that transform.
    let anchor_prefix = anchor_ca.rows(0, anchor_len).into_owned();
    let (rotation, translation) =
        optimal_transform(&anchor_truth.ca, &anchor_prefix, Some(&anchor_truth.mask))?;
    let moved_centroids: Vec<na::RowVector3<f64>> = truths
        .iter()
        .map(|truth| {
            let masked = masked_rows(&truth.ca, &truth.mask);
            if masked.nrows() == 0 {
                // Fully masked chain: a single zero point carried through
                translation
            } else {
                apply_transform(&masked, &rotation, &translation).row_mean()
            }
        })
        .collect();

    let permutation = greedy_assign(&moved_centroids, pred_centroids);
    let rmsd = global_rmsd(&permutation, truths, pred_profiles)?;
    Ok(Trial { permutation, rmsd })
}

/// For each ground-truth chain in turn, pick the nearest unused eligible
/// predicted chain (stable first-minimum tie-break). When no eligible
/// predicted chain remains, the first unused one keeps the permutation
/// total.
fn greedy_assign(
    moved_centroids: &[na::RowVector3<f64>],
    pred_centroids: &[Vec<Option<na::RowVector3<f64>>>],
) -> Vec<usize> {
    let mut used = vec![false; pred_centroids.len()];
    let mut permutation = Vec::with_capacity(moved_centroids.len());

    for (l, truth_centroid) in moved_centroids.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        for (k, row) in pred_centroids.iter().enumerate() {
            if used[k] {
                continue;
            }
            if let Some(centroid) = &row[l] {
                let dist = (centroid - truth_centroid).norm();
                if best.is_none_or(|(_, d)| dist < d) {
                    best = Some((k, dist));
                }
            }
        }
        let chosen = match best {
            Some((k, _)) => k,
            None => (0..used.len())
                .find(|&k| !used[k])
                .expect("chain counts were checked to match"),
        };
        used[chosen] = true;
        permutation.push(chosen);
    }
    permutation
}

/// Full re-superposition over the concatenation of every ground-truth
/// chain's valid rows against the assigned predicted chains' masked rows.
fn global_rmsd(
    permutation: &[usize],
    truths: &[&ChainProfile],
    pred_profiles: &[(String, ChainProfile)],
) -> Result<f64> {
    let mut truth_rows: Vec<na::RowVector3<f64>> = Vec::new();
    let mut pred_rows: Vec<na::RowVector3<f64>> = Vec::new();

    for (truth, &k) in truths.iter().zip(permutation) {
        let pred_ca = &pred_profiles[k].1.ca;
        for (i, &valid) in truth.mask.iter().enumerate() {
            if valid && i < pred_ca.nrows() {
                truth_rows.push(truth.ca.row(i).into_owned());
                pred_rows.push(pred_ca.row(i).into_owned());
            }
        }
    }

    let mut truth_all = na::MatrixXx3::<f64>::zeros(truth_rows.len());
    let mut pred_all = na::MatrixXx3::<f64>::zeros(pred_rows.len());
    for (i, row) in truth_rows.iter().enumerate() {
        truth_all.set_row(i, row);
    }
    for (i, row) in pred_rows.iter().enumerate() {
        pred_all.set_row(i, row);
    }
    kabsch_rmsd(&truth_all, &pred_all)
}
