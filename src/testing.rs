//! Builders for the synthetic structures used across unit tests.

use crate::chains::ChainProfile;
use crate::residues::WILDCARD;
use nalgebra as na;
use pdbtbx::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static SERIAL: AtomicUsize = AtomicUsize::new(1);

fn next_serial() -> usize {
    SERIAL.fetch_add(1, Ordering::Relaxed)
}

/// A residue with the given number, three-letter name and named atoms.
pub fn residue(number: isize, name: &str, atoms: &[(&str, &str, [f64; 3])]) -> Residue {
    let mut conformer = Conformer::new(name, None, None).unwrap();
    for (atom_name, element, pos) in atoms {
        let atom = Atom::new(
            false,
            next_serial(),
            *atom_name,
            pos[0],
            pos[1],
            pos[2],
            1.0,
            0.0,
            *element,
            0,
        )
        .unwrap();
        conformer.add_atom(atom);
    }
    Residue::new(number, None, Some(conformer)).unwrap()
}

/// A chain holding the given residues in order.
pub fn chain(id: &str, residues: Vec<Residue>) -> Chain {
    let mut chain = Chain::new(id).unwrap();
    for res in residues {
        chain.add_residue(res);
    }
    chain
}

/// A single-model structure holding the given chains in order.
pub fn pdb_from_chains(chains: Vec<Chain>) -> PDB {
    let mut model = Model::new(0);
    for c in chains {
        model.add_chain(c);
    }
    let mut pdb = PDB::new();
    pdb.add_model(model);
    pdb
}

fn three_letter(code: char) -> &'static str {
    match code {
        'A' => "ALA",
        'G' => "GLY",
        'K' => "LYS",
        'L' => "LEU",
        'M' => "MET",
        'S' => "SER",
        'V' => "VAL",
        'W' => "TRP",
        _ => "UNK",
    }
}

/// A peptide chain with one CA per sequence position and a CB heavy atom
/// offset from each CA, numbered from 1.
pub fn peptide(id: &str, seq: &str, ca: &[[f64; 3]], cb_offset: [f64; 3]) -> Chain {
    assert_eq!(seq.len(), ca.len());
    let residues = seq
        .chars()
        .zip(ca)
        .enumerate()
        .map(|(i, (code, pos))| {
            let cb = [
                pos[0] + cb_offset[0],
                pos[1] + cb_offset[1],
                pos[2] + cb_offset[2],
            ];
            residue(
                i as isize + 1,
                three_letter(code),
                &[("CA", "C", *pos), ("CB", "C", cb)],
            )
        })
        .collect();
    chain(id, residues)
}

/// An N×3 matrix from point rows.
pub fn point_matrix(points: &[[f64; 3]]) -> na::MatrixXx3<f64> {
    let mut m = na::MatrixXx3::<f64>::zeros(points.len());
    for (i, p) in points.iter().enumerate() {
        m.set_row(i, &na::RowVector3::new(p[0], p[1], p[2]));
    }
    m
}

/// A profile with the given sequence, zero coordinates and the mask implied
/// by the wildcard positions.
pub fn profile_from_seq(seq: &str) -> ChainProfile {
    ChainProfile {
        sequence: seq.to_string(),
        ca: na::MatrixXx3::zeros(seq.len()),
        mask: seq.chars().map(|c| c != WILDCARD).collect(),
        heavy: Vec::new(),
    }
}

/// A profile whose CA rows and heavy pool are both the given points.
pub fn profile_from_points(seq: &str, points: &[[f64; 3]]) -> ChainProfile {
    assert_eq!(seq.len(), points.len());
    ChainProfile {
        sequence: seq.to_string(),
        ca: point_matrix(points),
        mask: seq.chars().map(|c| c != WILDCARD).collect(),
        heavy: points.to_vec(),
    }
}
