//! Gap closing and per-chain sequence/coordinate extraction.
//!
//! Chains coming out of a structure file may skip residue numbers where the
//! experiment resolved nothing. Every consumer in this crate indexes the
//! sequence string and the anchor-coordinate rows with the same position, so
//! numbering gaps are first materialized as placeholder residues and the
//! extraction then walks the gap-closed chain.

use crate::error::{ChainMapError, Result};
use crate::residues::{ResidueExt, WILDCARD};
use nalgebra as na;
use pdbtbx::*;

/// Extensions over [`pdbtbx::Chain`] for gap-aware sequence extraction.
pub trait ChainExt {
    /// The chain sequence, one symbol per residue in stored order. Residues
    /// without a CA atom contribute the wildcard symbol.
    fn pdb_seq(&self) -> String;

    /// A new chain value in which every missing residue number between two
    /// observed residues is filled with an atom-less `UNK` placeholder, and
    /// residues are sorted by ascending serial number.
    ///
    /// Idempotent: closing the gaps of a gap-closed chain reproduces the
    /// same residue list, so re-extraction yields the identical sequence.
    fn close_gaps(&self) -> Chain;
}

impl ChainExt for Chain {
    fn pdb_seq(&self) -> String {
        self.residues()
            .map(|res| match res.backbone_anchor() {
                Some(_) => res.one_letter(),
                None => WILDCARD,
            })
            .collect()
    }

    fn close_gaps(&self) -> Chain {
        let mut residues: Vec<&Residue> = self.residues().collect();
        residues.sort_by_key(|res| res.serial_number());

        let mut closed = Chain::new(self.id()).unwrap();
        let mut last_number = 0;
        for res in residues {
            let number = res.serial_number();
            for missing in (last_number + 1)..number {
                let placeholder = Conformer::new("UNK", None, None).unwrap();
                closed.add_residue(Residue::new(missing, None, Some(placeholder)).unwrap());
            }
            closed.add_residue(res.clone());
            last_number = number;
        }
        closed
    }
}

/// Per-chain extraction product: sequence, anchor coordinates, validity mask
/// and the heavy-atom pool used for contact detection.
///
/// Invariant: `sequence.len() == ca.nrows() == mask.len()`.
#[derive(Debug, Clone)]
pub struct ChainProfile {
    /// One-letter sequence over the 22-symbol alphabet
    pub sequence: String,
    /// CA coordinates, one row per sequence position; wildcard positions
    /// hold a zero row
    pub ca: na::MatrixXx3<f64>,
    /// True where the position holds a valid (CA-bearing, standard) residue
    pub mask: Vec<bool>,
    /// Non-hydrogen side-chain and backbone atoms of valid residues,
    /// excluding the CA anchors themselves
    pub heavy: Vec<[f64; 3]>,
}

impl ChainProfile {
    /// Extract a profile from a gap-closed chain.
    ///
    /// A residue is valid iff it carries a CA atom and its name maps to a
    /// non-wildcard one-letter code; invalid residues emit the wildcard
    /// symbol and a zero anchor row. A violated length invariant means the
    /// residue numbering is malformed (e.g. duplicated CA conformers) and is
    /// reported as [`ChainMapError::SequenceLengthMismatch`].
    pub fn from_chain(chain: &Chain) -> Result<Self> {
        let mut sequence = String::new();
        let mut ca_rows: Vec<na::RowVector3<f64>> = Vec::new();
        let mut heavy: Vec<[f64; 3]> = Vec::new();

        for res in chain.residues() {
            let code = res.one_letter();
            if !res.is_standard_aa() || res.backbone_anchor().is_none() {
                sequence.push(WILDCARD);
                ca_rows.push(na::RowVector3::zeros());
                continue;
            }

            sequence.push(code);
            for atom in res.atoms() {
                let (x, y, z) = atom.pos();
                if atom.name() == "CA" {
                    ca_rows.push(na::RowVector3::new(x, y, z));
                } else if atom.element().is_none_or(|e| e != &Element::H) {
                    heavy.push([x, y, z]);
                }
            }
        }

        if sequence.chars().count() != ca_rows.len() {
            return Err(ChainMapError::SequenceLengthMismatch {
                chain: chain.id().to_string(),
                seq_len: sequence.chars().count(),
                coord_rows: ca_rows.len(),
            });
        }

        let mask: Vec<bool> = sequence.chars().map(|c| c != WILDCARD).collect();
        let mut ca = na::MatrixXx3::<f64>::zeros(ca_rows.len());
        for (i, row) in ca_rows.iter().enumerate() {
            ca.set_row(i, row);
        }

        Ok(Self {
            sequence,
            ca,
            mask,
            heavy,
        })
    }

    /// Number of valid residues.
    pub fn valid_len(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chain, residue};

    fn gapped_chain() -> Chain {
        chain(
            "A",
            vec![
                residue(1, "MET", &[("CA", "C", [0.0, 0.0, 0.0]), ("CB", "C", [0.0, 1.5, 0.0])]),
                residue(2, "LYS", &[("CA", "C", [3.8, 0.0, 0.0])]),
                residue(5, "LEU", &[("CA", "C", [15.2, 0.0, 0.0]), ("CD1", "C", [15.2, 1.4, 0.0])]),
            ],
        )
    }

    #[test]
    fn gaps_are_closed_with_placeholders() {
        let closed = gapped_chain().close_gaps();
        let numbers: Vec<isize> = closed.residues().map(|r| r.serial_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(closed.pdb_seq(), "MKXXL");
    }

    #[test]
    fn gap_closing_is_idempotent() {
        let once = gapped_chain().close_gaps();
        let twice = once.close_gaps();
        assert_eq!(once.pdb_seq(), twice.pdb_seq());
        assert_eq!(once.residue_count(), twice.residue_count());
    }

    #[test]
    fn profile_matches_sequence_extraction() {
        let closed = gapped_chain().close_gaps();
        let profile = ChainProfile::from_chain(&closed).unwrap();

        assert_eq!(profile.sequence, closed.pdb_seq());
        assert_eq!(profile.sequence.len(), profile.ca.nrows());
        assert_eq!(profile.mask, vec![true, true, false, false, true]);
        assert_eq!(profile.valid_len(), 3);

        // Wildcard positions hold zero anchor rows
        assert_eq!(profile.ca.row(2), na::RowVector3::zeros().row(0));
        // CA atoms are excluded from the heavy pool
        assert_eq!(profile.heavy.len(), 2);
        assert_eq!(profile.heavy[0], [0.0, 1.5, 0.0]);
    }

    #[test]
    fn leading_gap_is_filled_from_one() {
        let late_start = chain(
            "B",
            vec![residue(3, "GLY", &[("CA", "C", [1.0, 1.0, 1.0])])],
        );
        let closed = late_start.close_gaps();
        assert_eq!(closed.pdb_seq(), "XXG");
        let profile = ChainProfile::from_chain(&closed).unwrap();
        assert_eq!(profile.mask, vec![false, false, true]);
    }

    #[test]
    fn residue_without_anchor_is_wildcard() {
        let c = chain(
            "C",
            vec![
                residue(1, "ALA", &[("CA", "C", [0.0, 0.0, 0.0])]),
                residue(2, "ALA", &[("CB", "C", [1.0, 0.0, 0.0])]),
            ],
        );
        let profile = ChainProfile::from_chain(&c.close_gaps()).unwrap();
        assert_eq!(profile.sequence, "AX");
        assert_eq!(profile.mask, vec![true, false]);
        // Atoms of invalid residues never reach the heavy pool
        assert!(profile.heavy.is_empty());
    }
}
