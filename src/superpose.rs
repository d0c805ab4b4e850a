//! Least-squares rigid superposition via the Kabsch algorithm.
//!
//! Coordinates are row vectors throughout: a point set is an N×3 matrix and
//! a solved transform is applied as `aligned = x · R + t`.

use crate::error::{ChainMapError, Result};
use nalgebra as na;

/// Additive epsilon under the RMSD square root. Avoids a zero-gradient
/// singularity at perfect alignment.
pub const RMSD_EPS: f64 = 1e-6;

/// Select the rows of `coords` where `mask` is true.
pub fn masked_rows(coords: &na::MatrixXx3<f64>, mask: &[bool]) -> na::MatrixXx3<f64> {
    let selected: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| (m && i < coords.nrows()).then_some(i))
        .collect();
    let mut out = na::MatrixXx3::<f64>::zeros(selected.len());
    for (row, &i) in selected.iter().enumerate() {
        out.set_row(row, &coords.row(i));
    }
    out
}

fn centered(coords: &na::MatrixXx3<f64>) -> (na::MatrixXx3<f64>, na::RowVector3<f64>) {
    let centroid = coords.row_mean();
    let mut out = coords.clone();
    for i in 0..out.nrows() {
        out.set_row(i, &(coords.row(i) - centroid));
    }
    (out, centroid)
}

/// The rotation part of the Kabsch solution for two centered point sets.
///
/// The SVD's orthogonal factors are composed into a rotation; when the
/// determinant product is negative the last left-factor column is negated so
/// the result is proper (determinant +1, never a reflection).
fn kabsch_rotation(p: &na::MatrixXx3<f64>, q: &na::MatrixXx3<f64>) -> na::Matrix3<f64> {
    let cov = p.transpose() * q;
    let svd = cov.svd(true, true);
    let mut u = svd.u.unwrap();
    let v_t = svd.v_t.unwrap();

    if u.determinant() * v_t.determinant() < 0.0 {
        let negated = -u.column(2);
        u.set_column(2, &negated);
    }

    u * v_t
}

/// Solve for the rigid transform aligning `src` onto `tgt`.
///
/// With a mask, both point sets are restricted to the masked rows before
/// solving; a mask selecting zero rows degenerates both sides to a single
/// zero point so the computation stays well defined. The mask length and
/// both row counts must agree ([`ChainMapError::ShapeMismatch`] otherwise).
pub fn optimal_transform(
    src: &na::MatrixXx3<f64>,
    tgt: &na::MatrixXx3<f64>,
    mask: Option<&[bool]>,
) -> Result<(na::Matrix3<f64>, na::RowVector3<f64>)> {
    if src.nrows() != tgt.nrows() {
        return Err(ChainMapError::ShapeMismatch {
            expected: src.nrows(),
            found: tgt.nrows(),
        });
    }

    let (src, tgt) = match mask {
        Some(mask) => {
            if mask.len() != src.nrows() {
                return Err(ChainMapError::ShapeMismatch {
                    expected: src.nrows(),
                    found: mask.len(),
                });
            }
            let src_sel = masked_rows(src, mask);
            let tgt_sel = masked_rows(tgt, mask);
            if src_sel.nrows() == 0 {
                (na::MatrixXx3::zeros(1), na::MatrixXx3::zeros(1))
            } else {
                (src_sel, tgt_sel)
            }
        }
        None => (src.clone(), tgt.clone()),
    };

    let (src_centered, src_centroid) = centered(&src);
    let (tgt_centered, tgt_centroid) = centered(&tgt);

    let rotation = kabsch_rotation(&src_centered, &tgt_centered);
    let translation = tgt_centroid - src_centroid * rotation;
    Ok((rotation, translation))
}

/// Apply `x · R + t` to every row of a point set.
pub fn apply_transform(
    coords: &na::MatrixXx3<f64>,
    rotation: &na::Matrix3<f64>,
    translation: &na::RowVector3<f64>,
) -> na::MatrixXx3<f64> {
    let mut out = coords * rotation;
    for i in 0..out.nrows() {
        let row = out.row(i) + translation;
        out.set_row(i, &row);
    }
    out
}

/// Root-mean-square deviation between two equal-shaped point sets, with the
/// [`RMSD_EPS`] floor under the square root.
pub fn rmsd(a: &na::MatrixXx3<f64>, b: &na::MatrixXx3<f64>) -> Result<f64> {
    if a.nrows() != b.nrows() {
        return Err(ChainMapError::ShapeMismatch {
            expected: a.nrows(),
            found: b.nrows(),
        });
    }
    let n = a.nrows().max(1);
    let diff = a - b;
    let mean_sq = diff.row_iter().map(|row| row.norm_squared()).sum::<f64>() / n as f64;
    Ok((mean_sq + RMSD_EPS).sqrt())
}

/// RMSD of `a` against `b` after optimally superposing `a` onto `b`.
pub fn kabsch_rmsd(a: &na::MatrixXx3<f64>, b: &na::MatrixXx3<f64>) -> Result<f64> {
    let (rotation, translation) = optimal_transform(a, b, None)?;
    let aligned = apply_transform(a, &rotation, &translation);
    rmsd(&aligned, b)
}
