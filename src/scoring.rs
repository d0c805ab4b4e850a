//! The seam to the external per-interface scorer, plus score aggregation.
//!
//! The crate does not compute interface quality itself: for every contacting
//! ground-truth chain pair it builds two minimal two-chain structures (the
//! predicted pair and the ground-truth pair, restricted to valid residues
//! and with matched chain identifiers) and hands them to an
//! [`InterfaceScorer`]. Per-pair primary scores are aggregated by arithmetic
//! mean.

use crate::chains::ChainExt;
use crate::error::{ChainMapError, Result};
use crate::ChainMapping;
use pdbtbx::*;
use polars::prelude::*;
use tracing::{debug, info};

/// The metric bundle returned by the external interface scorer for one
/// chain pair.
#[derive(Debug, Clone)]
pub struct InterfaceMetrics {
    /// Primary interface quality score
    pub dockq: f64,
    /// Interface RMSD
    pub irms: f64,
    /// Ligand RMSD
    pub lrms: f64,
    /// Fraction of native contacts recovered
    pub fnat: f64,
    /// Correctly recovered native contacts
    pub nat_correct: u32,
    /// Total native contacts
    pub nat_total: u32,
    /// Fraction of non-native contacts
    pub fnonnat: f64,
    /// Number of non-native contacts
    pub nonnat_count: u32,
    /// Length of the first chain
    pub len1: u32,
    /// Length of the second chain
    pub len2: u32,
    /// Structural class of the first chain
    pub class1: String,
    /// Structural class of the second chain
    pub class2: String,
}

/// External collaborator computing interface quality for one pair of
/// two-chain structures. Both arguments are single-model structures whose
/// chain identifiers agree.
pub trait InterfaceScorer {
    /// Score the predicted pair against the ground-truth pair.
    fn score_pair(&self, pred: &PDB, truth: &PDB) -> Result<InterfaceMetrics>;
}

/// One scored interface, keyed by both chain namespaces.
#[derive(Debug, Clone)]
pub struct PairMetrics {
    /// First ground-truth chain (relabeled id)
    pub truth_i: String,
    /// Second ground-truth chain (relabeled id)
    pub truth_j: String,
    /// Predicted chain matched to `truth_i`
    pub pred_i: String,
    /// Predicted chain matched to `truth_j`
    pub pred_j: String,
    /// The scorer's metric bundle
    pub metrics: InterfaceMetrics,
}

/// Outcome of scoring a whole complex.
#[derive(Debug, Clone)]
pub enum ComplexScore {
    /// At least one contacting pair was scored.
    Scored {
        /// Mean primary score over all contacting pairs
        dockq: f64,
        /// Global alignment deviation of the chosen permutation
        rmsd: f64,
        /// The per-pair metric bundles
        pairs: Vec<PairMetrics>,
    },
    /// No ground-truth chain pair is in contact; there is no interface to
    /// score. A valid terminal outcome, not an error.
    NoContacts {
        /// Global alignment deviation of the chosen permutation
        rmsd: f64,
    },
}

fn round5(x: f64) -> f64 {
    (x * 1e5).round() / 1e5
}

/// A copy of `chain` renamed to `new_id`, keeping only the residues whose
/// mask position is true. Residues beyond the mask length are dropped.
fn masked_chain(chain: &Chain, mask: &[bool], new_id: &str) -> Result<Chain> {
    let mut out = Chain::new(new_id)
        .ok_or_else(|| ChainMapError::MalformedStructure(format!("chain id {new_id:?}")))?;
    for (res, &keep) in chain.residues().zip(mask) {
        if keep {
            out.add_residue(res.clone());
        }
    }
    Ok(out)
}

fn single_model(chains: Vec<Chain>) -> PDB {
    let mut model = Model::new(0);
    for chain in chains {
        model.add_chain(chain);
    }
    let mut pdb = PDB::new();
    pdb.add_model(model);
    pdb
}

fn model_seq(pdb: &PDB) -> String {
    pdb.chains().map(|c| c.pdb_seq()).collect()
}

/// Build the two minimal two-chain structures for one contacting
/// ground-truth pair: the predicted pair and the ground-truth pair, both
/// restricted by the ground-truth validity masks, with the ground-truth
/// chains relabeled to the matched predicted identifiers.
pub fn pair_models(mapping: &ChainMapping, truth_i: &str, truth_j: &str) -> Result<(PDB, PDB)> {
    let pred_i = mapping.assigned_pred(truth_i)?;
    let pred_j = mapping.assigned_pred(truth_j)?;
    let mask_i = &mapping.truth_profile(truth_i)?.mask;
    let mask_j = &mapping.truth_profile(truth_j)?.mask;

    let pred = single_model(vec![
        masked_chain(mapping.pred_chain(&pred_i)?, mask_i, &pred_i)?,
        masked_chain(mapping.pred_chain(&pred_j)?, mask_j, &pred_j)?,
    ]);
    let truth = single_model(vec![
        masked_chain(mapping.truth_chain(truth_i)?, mask_i, &pred_i)?,
        masked_chain(mapping.truth_chain(truth_j)?, mask_j, &pred_j)?,
    ]);

    let pred_seq = model_seq(&pred);
    let truth_seq = model_seq(&truth);
    if pred_seq != truth_seq {
        return Err(ChainMapError::SequenceDisagreement {
            pred: pred_seq,
            truth: truth_seq,
        });
    }
    Ok((pred, truth))
}

/// Score every contacting pair of the mapping and aggregate.
pub fn score_complex<S: InterfaceScorer>(
    mapping: &ChainMapping,
    scorer: &S,
) -> Result<ComplexScore> {
    let rmsd = round5(mapping.assignment.global_rmsd);
    if mapping.contact_pairs.is_empty() {
        info!("no contacting chain pairs, no interface score available");
        return Ok(ComplexScore::NoContacts { rmsd });
    }

    let mut pairs = Vec::with_capacity(mapping.contact_pairs.len());
    for (truth_i, truth_j) in &mapping.contact_pairs {
        let (pred, truth) = pair_models(mapping, truth_i, truth_j)?;
        let metrics = scorer.score_pair(&pred, &truth)?;
        debug!(truth_i = %truth_i, truth_j = %truth_j, dockq = metrics.dockq, "scored interface");
        pairs.push(PairMetrics {
            truth_i: truth_i.clone(),
            truth_j: truth_j.clone(),
            pred_i: mapping.assigned_pred(truth_i)?,
            pred_j: mapping.assigned_pred(truth_j)?,
            metrics,
        });
    }

    let dockq = round5(pairs.iter().map(|p| p.metrics.dockq).sum::<f64>() / pairs.len() as f64);
    Ok(ComplexScore::Scored { dockq, rmsd, pairs })
}

/// Serializable per-pair metric table for the reporting sink.
pub fn metrics_to_dataframe(pairs: &[PairMetrics]) -> DataFrame {
    df!(
        "pred_i" => pairs.iter().map(|p| p.pred_i.clone()).collect::<Vec<String>>(),
        "pred_j" => pairs.iter().map(|p| p.pred_j.clone()).collect::<Vec<String>>(),
        "DockQ" => pairs.iter().map(|p| p.metrics.dockq).collect::<Vec<f64>>(),
        "irms" => pairs.iter().map(|p| p.metrics.irms).collect::<Vec<f64>>(),
        "Lrms" => pairs.iter().map(|p| p.metrics.lrms).collect::<Vec<f64>>(),
        "fnat" => pairs.iter().map(|p| p.metrics.fnat).collect::<Vec<f64>>(),
        "nat_correct" => pairs.iter().map(|p| p.metrics.nat_correct).collect::<Vec<u32>>(),
        "nat_total" => pairs.iter().map(|p| p.metrics.nat_total).collect::<Vec<u32>>(),
        "fnonnat" => pairs.iter().map(|p| p.metrics.fnonnat).collect::<Vec<f64>>(),
        "nonnat_count" => pairs.iter().map(|p| p.metrics.nonnat_count).collect::<Vec<u32>>(),
        "len1" => pairs.iter().map(|p| p.metrics.len1).collect::<Vec<u32>>(),
        "len2" => pairs.iter().map(|p| p.metrics.len2).collect::<Vec<u32>>(),
        "class1" => pairs.iter().map(|p| p.metrics.class1.clone()).collect::<Vec<String>>(),
        "class2" => pairs.iter().map(|p| p.metrics.class2.clone()).collect::<Vec<String>>(),
        "truth_i" => pairs.iter().map(|p| p.truth_i.clone()).collect::<Vec<String>>(),
        "truth_j" => pairs.iter().map(|p| p.truth_j.clone()).collect::<Vec<String>>(),
    )
    .unwrap()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::map_complex;
    use crate::testing::{pdb_from_chains, peptide};

    /// Fixed-output scorer standing in for the external collaborator.
    pub(crate) struct FixedScorer(pub f64);

    impl InterfaceScorer for FixedScorer {
        fn score_pair(&self, pred: &PDB, truth: &PDB) -> Result<InterfaceMetrics> {
            assert_eq!(pred.chain_count(), 2);
            assert_eq!(truth.chain_count(), 2);
            Ok(InterfaceMetrics {
                dockq: self.0,
                irms: 0.5,
                lrms: 1.0,
                fnat: 0.9,
                nat_correct: 18,
                nat_total: 20,
                fnonnat: 0.1,
                nonnat_count: 2,
                len1: 4,
                len2: 4,
                class1: "receptor".to_string(),
                class2: "ligand".to_string(),
            })
        }
    }

    fn dimer_chains(ids: [&str; 2]) -> Vec<Chain> {
        let ca_a: Vec<[f64; 3]> = (0..4).map(|i| [3.8 * i as f64, 0.0, 0.0]).collect();
        let ca_b: Vec<[f64; 3]> = (0..4).map(|i| [3.8 * i as f64, 4.5, 0.0]).collect();
        vec![
            peptide(ids[0], "MKLV", &ca_a, [0.0, 1.5, 0.0]),
            peptide(ids[1], "GGSA", &ca_b, [0.0, -1.5, 0.0]),
        ]
    }

    #[test]
    fn pair_models_share_sequences_and_ids() {
        let pred = pdb_from_chains(dimer_chains(["P", "Q"]));
        let truth = dimer_chains(["X", "Y"]);
        let mapping = map_complex(&pred, truth).unwrap();

        assert_eq!(mapping.contact_pairs.len(), 1);
        let (ti, tj) = mapping.contact_pairs[0].clone();
        let (pred_pair, truth_pair) = pair_models(&mapping, &ti, &tj).unwrap();

        let pred_ids: Vec<&str> = pred_pair.chains().map(|c| c.id()).collect();
        let truth_ids: Vec<&str> = truth_pair.chains().map(|c| c.id()).collect();
        assert_eq!(pred_ids, truth_ids);
        assert_eq!(model_seq(&pred_pair), model_seq(&truth_pair));
    }

    #[test]
    fn scores_are_averaged_over_contacting_pairs() {
        let pred = pdb_from_chains(dimer_chains(["P", "Q"]));
        let truth = dimer_chains(["X", "Y"]);
        let mapping = map_complex(&pred, truth).unwrap();

        match score_complex(&mapping, &FixedScorer(0.75)).unwrap() {
            ComplexScore::Scored { dockq, rmsd, pairs } => {
                assert_eq!(pairs.len(), 1);
                assert!((dockq - 0.75).abs() < 1e-12);
                assert!(rmsd >= 0.0);
            }
            ComplexScore::NoContacts { .. } => panic!("expected a scored complex"),
        }
    }

    #[test]
    fn distant_chains_yield_no_contacts() {
        let ca_a: Vec<[f64; 3]> = (0..4).map(|i| [3.8 * i as f64, 0.0, 0.0]).collect();
        let ca_b: Vec<[f64; 3]> = (0..4).map(|i| [3.8 * i as f64, 100.0, 0.0]).collect();
        let chains = |ids: [&str; 2]| {
            vec![
                peptide(ids[0], "MKLV", &ca_a, [0.0, 1.5, 0.0]),
                peptide(ids[1], "GGSA", &ca_b, [0.0, -1.5, 0.0]),
            ]
        };
        let pred = pdb_from_chains(chains(["P", "Q"]));
        let mapping = map_complex(&pred, chains(["X", "Y"])).unwrap();

        assert!(mapping.contact_pairs.is_empty());
        assert!(matches!(
            score_complex(&mapping, &FixedScorer(0.9)).unwrap(),
            ComplexScore::NoContacts { .. }
        ));
    }

    #[test]
    fn metric_table_has_the_report_columns() {
        let pairs = vec![PairMetrics {
            truth_i: "A".to_string(),
            truth_j: "B".to_string(),
            pred_i: "P".to_string(),
            pred_j: "Q".to_string(),
            metrics: FixedScorer(0.5)
                .score_pair(
                    &pdb_from_chains(dimer_chains(["P", "Q"])),
                    &pdb_from_chains(dimer_chains(["P", "Q"])),
                )
                .unwrap(),
        }];
        let df = metrics_to_dataframe(&pairs);
        assert_eq!(df.height(), 1);
        for col in ["DockQ", "irms", "Lrms", "fnat", "class1", "truth_j"] {
            assert!(df.column(col).is_ok());
        }
    }
}
