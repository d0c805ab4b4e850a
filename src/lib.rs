#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! # Chainmap Library
//!
//! This library decides which predicted chain of a multi-chain structure
//! corresponds to which ground-truth chain, and computes the rigid
//! superposition that best aligns them, so that per-interface quality
//! metrics can be computed on correctly paired chains.
//!
//! The pipeline is: gap-closed sequence/coordinate extraction per chain,
//! wildcard-aware candidate correspondence, an anchor search over rigid
//! superpositions selecting the chain permutation with minimal global
//! deviation, and heavy-atom contact detection restricting downstream
//! scoring to physically interacting chain pairs. The per-interface scorer
//! itself is an external collaborator behind the
//! [`InterfaceScorer`](scoring::InterfaceScorer) trait.

pub mod chains;
pub mod contacts;
pub mod correspondence;
pub mod error;
pub mod permutation;
pub mod residues;
pub mod scoring;
pub mod superpose;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key public types
pub use chains::{ChainExt, ChainProfile};
pub use correspondence::{CandidateTable, SequenceGroup};
pub use error::{ChainMapError, Result};
pub use permutation::ChainAssignment;
pub use scoring::{score_complex, ComplexScore, InterfaceMetrics, InterfaceScorer, PairMetrics};
pub use utils::{
    gather_truth_chains, load_model, run_with_threads, write_df_to_file, DataFrameFileType,
};

use crate::correspondence::group_by_sequence;
use pdbtbx::*;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Identifiers handed to ground-truth chains in input order, so chains
/// collected from several files never clash.
pub const CHAIN_RELABEL_IDS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// The resolved correspondence between a predicted complex and its ground
/// truth, together with everything needed to build per-pair structures for
/// interface scoring.
#[derive(Debug)]
pub struct ChainMapping {
    pred_chains: Vec<Chain>,
    truth_chains: Vec<Chain>,
    truth_profiles: Vec<(String, ChainProfile)>,
    truth_labels: Vec<(String, String)>,
    /// The candidate correspondence table
    pub candidates: CandidateTable,
    /// The selected permutation and its global deviation
    pub assignment: ChainAssignment,
    /// Contacting ground-truth chain pairs, in assignment order
    pub contact_pairs: Vec<(String, String)>,
}

impl ChainMapping {
    /// The gap-closed predicted chain with the given identifier.
    pub fn pred_chain(&self, id: &str) -> Result<&Chain> {
        self.pred_chains
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| ChainMapError::UnknownChain(id.to_string()))
    }

    /// The gap-closed, relabeled ground-truth chain.
    pub fn truth_chain(&self, id: &str) -> Result<&Chain> {
        self.truth_chains
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| ChainMapError::UnknownChain(id.to_string()))
    }

    /// The extraction profile of a ground-truth chain.
    pub fn truth_profile(&self, id: &str) -> Result<&ChainProfile> {
        self.truth_profiles
            .iter()
            .find(|(tid, _)| tid == id)
            .map(|(_, p)| p)
            .ok_or_else(|| ChainMapError::UnknownChain(id.to_string()))
    }

    /// The predicted chain assigned to a ground-truth chain.
    pub fn assigned_pred(&self, truth_id: &str) -> Result<String> {
        self.assignment
            .pred_of(truth_id)
            .map(|p| p.to_string())
            .ok_or_else(|| ChainMapError::UnknownChain(truth_id.to_string()))
    }

    /// `(relabeled id, original id)` of every ground-truth chain, in input
    /// order.
    pub fn truth_labels(&self) -> &[(String, String)] {
        &self.truth_labels
    }

    /// The contacting pairs with their matched predicted chains, for the
    /// reporting sink.
    pub fn contacts_dataframe(&self) -> DataFrame {
        let pred_of = |t: &str| self.assigned_pred(t).unwrap_or_default();
        df!(
            "truth_i" => self.contact_pairs.iter().map(|(i, _)| i.clone()).collect::<Vec<String>>(),
            "truth_j" => self.contact_pairs.iter().map(|(_, j)| j.clone()).collect::<Vec<String>>(),
            "pred_i" => self.contact_pairs.iter().map(|(i, _)| pred_of(i)).collect::<Vec<String>>(),
            "pred_j" => self.contact_pairs.iter().map(|(_, j)| pred_of(j)).collect::<Vec<String>>(),
        )
        .unwrap()
    }
}

/// Map the chains of a predicted structure onto the ground-truth chains.
///
/// The prediction contributes the chains of its first model; the ground
/// truth may have been collected from one multi-chain file or from several
/// single-chain files (see [`gather_truth_chains`]). Chain counts must
/// match, and ground-truth chains are relabeled over
/// [`CHAIN_RELABEL_IDS`] in input order before any comparison.
///
/// # Example
///
/// ```no_run
/// use chainmap::{load_model, gather_truth_chains, map_complex};
/// use std::path::Path;
///
/// let (pred, _warnings) = load_model("pred.pdb").unwrap();
/// let truth = gather_truth_chains(Path::new("truth.pdb"), None, Path::new("pred.pdb")).unwrap();
/// let mapping = map_complex(&pred, truth).unwrap();
/// println!("global RMSD {:.3}", mapping.assignment.global_rmsd);
/// ```
pub fn map_complex(pred: &PDB, truth_chains: Vec<Chain>) -> Result<ChainMapping> {
    let pred_input: Vec<&Chain> = match pred.models().next() {
        Some(model) => model.chains().collect(),
        None => Vec::new(),
    };
    if truth_chains.len() != pred_input.len() {
        return Err(ChainMapError::ChainCountMismatch {
            truth: truth_chains.len(),
            pred: pred_input.len(),
        });
    }
    if truth_chains.len() > CHAIN_RELABEL_IDS.len() {
        return Err(ChainMapError::TooManyChains(truth_chains.len()));
    }

    let pred_chains: Vec<Chain> = pred_input.iter().map(|c| c.close_gaps()).collect();
    let pred_profiles: Vec<(String, ChainProfile)> = pred_chains
        .iter()
        .map(|c| Ok((c.id().to_string(), ChainProfile::from_chain(c)?)))
        .collect::<Result<_>>()?;

    let mut relabeled: Vec<Chain> = Vec::with_capacity(truth_chains.len());
    let mut truth_labels: Vec<(String, String)> = Vec::with_capacity(truth_chains.len());
    for (chain, label) in truth_chains.iter().zip(CHAIN_RELABEL_IDS.chars()) {
        let label = label.to_string();
        let closed = chain.close_gaps();
        let mut renamed = Chain::new(&label)
            .ok_or_else(|| ChainMapError::MalformedStructure(format!("chain id {label:?}")))?;
        for res in closed.residues() {
            renamed.add_residue(res.clone());
        }
        truth_labels.push((label, chain.id().to_string()));
        relabeled.push(renamed);
    }
    let truth_profiles: Vec<(String, ChainProfile)> = relabeled
        .iter()
        .map(|c| Ok((c.id().to_string(), ChainProfile::from_chain(c)?)))
        .collect::<Result<_>>()?;

    let groups = group_by_sequence(&pred_profiles);
    for group in &groups {
        debug!(
            members = %group.members.join(""),
            len = group.sequence.len(),
            "predicted sequence group"
        );
    }
    let candidates = CandidateTable::build(&groups, &truth_profiles);
    let assignment = permutation::solve(&candidates, &pred_profiles, &truth_profiles)?;
    info!(
        rmsd = assignment.global_rmsd,
        trials = assignment.trials,
        "selected chain permutation"
    );

    let contact_pairs = contacts::contacting_pairs(&assignment.truth_order(), &truth_profiles);
    debug!(pairs = contact_pairs.len(), "contacting chain pairs");

    Ok(ChainMapping {
        pred_chains,
        truth_chains: relabeled,
        truth_profiles,
        truth_labels,
        candidates,
        assignment,
        contact_pairs,
    })
}

/// Gap-closed sequences of all chains in a structure, keyed by chain id.
pub fn get_sequences(pdb: &PDB) -> HashMap<String, String> {
    pdb.chains()
        .map(|chain| (chain.id().to_string(), chain.close_gaps().pdb_seq()))
        .collect()
}
