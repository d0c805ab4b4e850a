//! Residue-level helpers for sequence extraction.

use pdbtbx::*;

/// Symbol emitted for residues of unknown identity. Compatible with every
/// residue type during sequence comparison.
pub const WILDCARD: char = 'X';

/// Extensions over [`pdbtbx::Residue`] for sequence and coordinate extraction.
pub trait ResidueExt {
    /// The residue one-letter code. Unknown or non-standard residue names
    /// map to the wildcard symbol [`WILDCARD`].
    fn one_letter(&self) -> char;

    /// Whether the residue name maps to a non-wildcard one-letter code.
    fn is_standard_aa(&self) -> bool;

    /// The backbone anchor (CA) atom, if the residue has one.
    fn backbone_anchor(&self) -> Option<&Atom>;
}

impl ResidueExt for Residue {
    fn one_letter(&self) -> char {
        match self.name().unwrap_or("").to_uppercase().as_str() {
            "ALA" => 'A',
            "ARG" => 'R',
            "ASN" => 'N',
            "ASP" => 'D',
            "CYS" => 'C',
            "GLN" => 'Q',
            "GLU" => 'E',
            "GLY" => 'G',
            "HIS" => 'H',
            "ILE" => 'I',
            "LEU" => 'L',
            "LYS" => 'K',
            "MET" => 'M',
            "PHE" => 'F',
            "PRO" => 'P',
            "SER" => 'S',
            "THR" => 'T',
            "TRP" => 'W',
            "TYR" => 'Y',
            "VAL" => 'V',
            "SEC" => 'U', // selenocysteine
            "PYL" => 'O', // pyrrolysine
            _ => WILDCARD,
        }
    }

    fn is_standard_aa(&self) -> bool {
        self.one_letter() != WILDCARD
    }

    fn backbone_anchor(&self) -> Option<&Atom> {
        self.atoms().find(|atom| atom.name() == "CA")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::residue;

    #[test]
    fn standard_codes() {
        let res = residue(1, "GLY", &[("CA", "C", [0.0, 0.0, 0.0])]);
        assert_eq!(res.one_letter(), 'G');
        assert!(res.backbone_anchor().is_some());

        let res = residue(2, "sec", &[("CA", "C", [0.0, 0.0, 0.0])]);
        assert_eq!(res.one_letter(), 'U');
        assert!(res.is_standard_aa());
    }

    #[test]
    fn unknown_names_are_wildcards() {
        let res = residue(1, "UNK", &[]);
        assert_eq!(res.one_letter(), WILDCARD);
        assert!(!res.is_standard_aa());
        assert!(res.backbone_anchor().is_none());

        let res = residue(2, "GTP", &[("PA", "P", [0.0, 0.0, 0.0])]);
        assert_eq!(res.one_letter(), WILDCARD);
    }
}
