//! Structure loading, ground-truth collection and table output helpers.

use crate::error::{ChainMapError, Result};
use pdbtbx::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Open an atomic data file with [`pdbtbx::ReadOptions`] and remove
/// heteroatom-only residues (waters, ligands) from the model.
pub fn load_model(input_file: &str) -> Result<(PDB, Vec<PDBError>)> {
    let (mut pdb, errors) = pdbtbx::ReadOptions::default()
        .set_only_atomic_coords(true)
        .set_level(pdbtbx::StrictnessLevel::Loose)
        .read(input_file)
        .map_err(|errs| ChainMapError::StructureRead {
            path: input_file.to_string(),
            details: errs
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })?;

    // Heteroatom-only residues never contribute to sequences or contacts
    pdb.remove_residues_by(|res| res.atoms().all(|atom| atom.hetero()));

    Ok((pdb, errors))
}

/// Collect the ground-truth chains for a complex.
///
/// When `truth_path` is a file, all chains of its first model are used in
/// file order. When it is a directory, every file named `{pdb_id}*pdb`
/// inside it (excluding the prediction itself) contributes its first chain,
/// in lexicographic path order.
pub fn gather_truth_chains(
    truth_path: &Path,
    pdb_id: Option<&str>,
    pred_path: &Path,
) -> Result<Vec<Chain>> {
    if truth_path.is_file() {
        let (truth, _) = load_model(&truth_path.to_string_lossy())?;
        let chains = match truth.models().next() {
            Some(model) => model.chains().cloned().collect(),
            None => Vec::new(),
        };
        return Ok(chains);
    }

    let pdb_id = pdb_id.ok_or(ChainMapError::MissingPdbId)?;
    let pred_canonical = pred_path.canonicalize().ok();

    let mut files: Vec<PathBuf> = std::fs::read_dir(truth_path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.starts_with(pdb_id) && name.ends_with("pdb")
        })
        .filter(|path| match &pred_canonical {
            Some(pred) => path.canonicalize().map_or(true, |c| &c != pred),
            None => true,
        })
        .collect();
    files.sort();

    let mut chains = Vec::with_capacity(files.len());
    for file in files {
        debug!(file = %file.display(), "ground truth chain file");
        let (truth, _) = load_model(&file.to_string_lossy())?;
        let chain = truth
            .models()
            .next()
            .and_then(|m| m.chains().next())
            .cloned();
        if let Some(chain) = chain {
            chains.push(chain);
        }
    }
    Ok(chains)
}

/// Run a closure inside a dedicated rayon thread pool. `num_threads == 0`
/// uses all available cores.
pub fn run_with_threads<T: Send>(num_threads: usize, f: impl FnOnce() -> T + Send) -> T {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .expect("failed to build thread pool");
    pool.install(f)
}

/// Write a DataFrame to a file of the given format.
pub fn write_df_to_file(df: &mut DataFrame, file_path: &Path, file_type: DataFrameFileType) {
    let file_suffix = file_type.to_string();
    let mut file = std::fs::File::create(file_path.with_extension(file_suffix)).unwrap();
    match file_type {
        DataFrameFileType::Csv => {
            CsvWriter::new(&mut file).finish(df).unwrap();
        }
        DataFrameFileType::Parquet => {
            ParquetWriter::new(&mut file).finish(df).unwrap();
        }
        DataFrameFileType::Json => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(df)
                .unwrap();
        }
        DataFrameFileType::NDJson => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(df)
                .unwrap();
        }
    }
}

/// File format for writing DataFrames.
#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum DataFrameFileType {
    /// Comma-separated values
    Csv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
    /// Newline-delimited JSON
    NDJson,
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
            DataFrameFileType::NDJson => write!(f, "ndjson"),
        }
    }
}
