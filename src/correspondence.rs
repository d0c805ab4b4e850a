//! Sequence-based candidate chain correspondence.
//!
//! Predicted chains with identical sequences are merged into one group, and
//! every ground-truth chain is matched against each group by wildcard-aware
//! position-wise comparison. The resulting table drives the anchor search:
//! its first row is the anchor ground-truth chain.

use crate::chains::ChainProfile;
use crate::residues::WILDCARD;
use polars::prelude::*;
use tracing::debug;

/// Predicted chains sharing one sequence, member ids in file order.
#[derive(Debug, Clone)]
pub struct SequenceGroup {
    /// Identifiers of the member chains
    pub members: Vec<String>,
    /// The shared sequence
    pub sequence: String,
}

/// Merge predicted chains with byte-identical sequences, preserving
/// first-seen group order.
pub fn group_by_sequence(profiles: &[(String, ChainProfile)]) -> Vec<SequenceGroup> {
    let mut groups: Vec<SequenceGroup> = Vec::new();
    for (id, profile) in profiles {
        match groups.iter_mut().find(|g| g.sequence == profile.sequence) {
            Some(group) => group.members.push(id.clone()),
            None => groups.push(SequenceGroup {
                members: vec![id.clone()],
                sequence: profile.sequence.clone(),
            }),
        }
    }
    groups
}

/// Whether a predicted sequence can represent a ground-truth sequence: it
/// must be at least as long, and position-wise over the ground-truth length
/// no pair of symbols may be non-wildcard and unequal.
pub fn sequences_compatible(pred: &str, truth: &str) -> bool {
    if pred.chars().count() < truth.chars().count() {
        return false;
    }
    pred.chars()
        .zip(truth.chars())
        .all(|(p, t)| p == t || p == WILDCARD || t == WILDCARD)
}

/// One ground-truth chain and its plausible predicted chains.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    /// Ground-truth chain identifier (relabeled)
    pub truth_id: String,
    /// Ground-truth sequence
    pub truth_seq: String,
    /// Number of valid residues in the ground-truth chain
    pub valid_len: usize,
    /// Predicted chain ids whose sequence is compatible, in group order
    pub candidates: Vec<String>,
}

/// The candidate correspondence table, rows in anchor-priority order.
#[derive(Debug, Clone)]
pub struct CandidateTable {
    /// One row per ground-truth chain
    pub rows: Vec<CandidateRow>,
}

impl CandidateTable {
    /// Build the table from the grouped predicted sequences and the
    /// ground-truth profiles.
    ///
    /// Rows are ordered by (fewest candidate chains, most valid residues),
    /// so the first row is the best-conditioned anchor: the least ambiguous
    /// ground-truth chain with the longest usable coordinate set. Rows with
    /// no candidates sort last and are only reached via the greedy fallback.
    pub fn build(groups: &[SequenceGroup], truth_profiles: &[(String, ChainProfile)]) -> Self {
        let mut rows: Vec<CandidateRow> = truth_profiles
            .iter()
            .map(|(truth_id, profile)| {
                let candidates: Vec<String> = groups
                    .iter()
                    .filter(|g| sequences_compatible(&g.sequence, &profile.sequence))
                    .flat_map(|g| g.members.iter().cloned())
                    .collect();
                CandidateRow {
                    truth_id: truth_id.clone(),
                    truth_seq: profile.sequence.clone(),
                    valid_len: profile.valid_len(),
                    candidates,
                }
            })
            .collect();

        rows.sort_by_key(|row| {
            (
                row.candidates.is_empty(),
                row.candidates.len(),
                usize::MAX - row.valid_len,
            )
        });
        for row in &rows {
            debug!(
                truth = %row.truth_id,
                candidates = %row.candidates.join(""),
                valid_len = row.valid_len,
                "candidate correspondence"
            );
        }
        Self { rows }
    }

    /// The candidate predicted-chain ids for one ground-truth chain, empty
    /// when the chain matched nothing.
    pub fn candidates_of(&self, truth_id: &str) -> &[String] {
        self.rows
            .iter()
            .find(|row| row.truth_id == truth_id)
            .map(|row| row.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// Ground-truth chain ids in table (anchor-priority) order.
    pub fn truth_order(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.truth_id.clone()).collect()
    }

    /// Serializable form for the reporting sink.
    pub fn to_dataframe(&self) -> DataFrame {
        df!(
            "truth_cid" => self.rows.iter().map(|r| r.truth_id.clone()).collect::<Vec<String>>(),
            "pred_cid" => self.rows.iter().map(|r| r.candidates.join("")).collect::<Vec<String>>(),
            "num_chains" => self.rows.iter().map(|r| r.candidates.len() as u32).collect::<Vec<u32>>(),
            "true_seq_len" => self.rows.iter().map(|r| r.valid_len as u32).collect::<Vec<u32>>(),
            "truth_seq" => self.rows.iter().map(|r| r.truth_seq.clone()).collect::<Vec<String>>(),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::profile_from_seq;

    #[test]
    fn wildcard_comparison() {
        assert!(sequences_compatible("MKLV", "MKLV"));
        assert!(sequences_compatible("MKXV", "MKLV"));
        assert!(sequences_compatible("MKLV", "MXLV"));
        assert!(sequences_compatible("MKLVAA", "MKLV")); // longer prediction
        assert!(!sequences_compatible("MKL", "MKLV")); // shorter prediction
        assert!(!sequences_compatible("MKLV", "MKLA"));
        assert!(sequences_compatible("XXXX", "MKLV"));
    }

    #[test]
    fn identical_sequences_are_grouped() {
        let profiles = vec![
            ("A".to_string(), profile_from_seq("MKLV")),
            ("B".to_string(), profile_from_seq("GGS")),
            ("C".to_string(), profile_from_seq("MKLV")),
        ];
        let groups = group_by_sequence(&profiles);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["A", "C"]);
        assert_eq!(groups[1].members, vec!["B"]);
    }

    #[test]
    fn anchor_row_is_least_ambiguous_longest() {
        let pred = vec![
            ("A".to_string(), profile_from_seq("MKLV")),
            ("B".to_string(), profile_from_seq("MKLV")),
            ("C".to_string(), profile_from_seq("GGSAA")),
        ];
        let truth = vec![
            ("A".to_string(), profile_from_seq("MKLV")),
            ("B".to_string(), profile_from_seq("MKLV")),
            ("C".to_string(), profile_from_seq("GGSAA")),
        ];
        let groups = group_by_sequence(&pred);
        let table = CandidateTable::build(&groups, &truth);

        // The unambiguous single-candidate chain anchors the search
        assert_eq!(table.rows[0].truth_id, "C");
        assert_eq!(table.rows[0].candidates, vec!["C"]);
        assert_eq!(table.candidates_of("A"), &["A", "B"]);
        assert_eq!(table.truth_order(), vec!["C", "A", "B"]);
    }

    #[test]
    fn unmatched_truth_sorts_last() {
        let pred = vec![("A".to_string(), profile_from_seq("MKLV"))];
        let truth = vec![
            ("A".to_string(), profile_from_seq("WWWW")),
            ("B".to_string(), profile_from_seq("MKLV")),
        ];
        let table = CandidateTable::build(&group_by_sequence(&pred), &truth);
        assert_eq!(table.rows[0].truth_id, "B");
        assert!(table.rows[1].candidates.is_empty());
        assert!(table.candidates_of("A").is_empty());
    }

    #[test]
    fn dataframe_round_trip() {
        let pred = vec![
            ("A".to_string(), profile_from_seq("MKLV")),
            ("B".to_string(), profile_from_seq("MKLV")),
        ];
        let truth = pred.clone();
        let table = CandidateTable::build(&group_by_sequence(&pred), &truth);
        let df = table.to_dataframe();
        assert_eq!(df.height(), 2);
        let pred_cid = df.column("pred_cid").unwrap().str().unwrap();
        assert_eq!(pred_cid.get(0), Some("AB"));
    }
}
