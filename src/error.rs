//! Error types for chain mapping.
//!
//! All fatal conditions abort the correspondence computation for the whole
//! complex; the library never surfaces a partial permutation as authoritative.

use thiserror::Error;

/// Errors raised while mapping chains of a predicted complex onto the
/// ground truth.
#[derive(Debug, Error)]
pub enum ChainMapError {
    /// Two coordinate sets that must be paired row-by-row disagree in length.
    #[error("coordinate shape mismatch: expected {expected} rows, found {found}")]
    ShapeMismatch {
        /// Row count of the reference set
        expected: usize,
        /// Row count of the offending set
        found: usize,
    },

    /// A chain's sequence length does not equal its anchor-coordinate row
    /// count after gap closing. Indicates malformed residue numbering.
    #[error("chain {chain}: sequence length {seq_len} != coordinate rows {coord_rows}")]
    SequenceLengthMismatch {
        /// Chain identifier
        chain: String,
        /// Extracted sequence length
        seq_len: usize,
        /// Anchor coordinate row count
        coord_rows: usize,
    },

    /// The ground truth and the prediction do not have the same number of
    /// chains. Checked before any alignment work begins.
    #[error("ground truth has {truth} chains but the prediction has {pred}")]
    ChainCountMismatch {
        /// Number of ground-truth chains
        truth: usize,
        /// Number of predicted chains
        pred: usize,
    },

    /// Both structures are empty; there is nothing to map.
    #[error("the complex has no chains to map")]
    EmptyComplex,

    /// The anchor ground-truth chain matches no predicted chain, so no
    /// superposition trial can be seeded.
    #[error("anchor chain {0} has no candidate predicted chains")]
    NoAnchorCandidates(String),

    /// More ground-truth chains than available relabeling identifiers.
    #[error("complex has {0} ground-truth chains, at most 62 are supported")]
    TooManyChains(usize),

    /// The solver assigned a predicted chain outside a ground-truth chain's
    /// candidate set. Only reachable when duplicate sequences exhaust a
    /// candidate set mid-assignment.
    #[error("chain {truth_id} was assigned predicted chain {pred_id} outside its candidate set")]
    IneligibleAssignment {
        /// Ground-truth chain identifier
        truth_id: String,
        /// Assigned predicted chain identifier
        pred_id: String,
    },

    /// The two-chain pair models handed to the interface scorer disagree on
    /// sequence, meaning the masks were applied inconsistently.
    #[error("paired models disagree on sequence:\n{pred}\n{truth}")]
    SequenceDisagreement {
        /// Sequence of the predicted pair model
        pred: String,
        /// Sequence of the ground-truth pair model
        truth: String,
    },

    /// A chain identifier was looked up that the mapping does not know.
    #[error("unknown chain {0}")]
    UnknownChain(String),

    /// A pdb id is required to locate per-chain ground-truth files.
    #[error("a pdb id is required when the ground truth is a directory")]
    MissingPdbId,

    /// A pdbtbx identifier was rejected while rebuilding a structure.
    #[error("failed to build structure element: {0}")]
    MalformedStructure(String),

    /// The external interface scorer failed on a chain pair.
    #[error("interface scorer failed: {0}")]
    Scorer(String),

    /// Reading a structure file produced breaking errors.
    #[error("failed to read structure {path}: {details}")]
    StructureRead {
        /// Path of the offending file
        path: String,
        /// Concatenated reader errors
        details: String,
    },

    /// Filesystem error while locating ground-truth files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChainMapError>;
