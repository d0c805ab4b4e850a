use chainmap::{
    gather_truth_chains, load_model, map_complex, run_with_threads, write_df_to_file,
    DataFrameFileType,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Path to the predicted structure containing all chains
    #[arg(short, long)]
    pred: PathBuf,

    /// Ground truth: a multi-chain structure file, or a directory of
    /// per-chain files matching "{pdb-id}*pdb"
    #[arg(short, long)]
    truth: PathBuf,

    /// PDB id, required when the ground truth is a directory
    #[arg(long = "pdb-id")]
    pdb_id: Option<String>,

    /// Output directory for intermediate tables
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Save the candidate, match and contact tables to the output directory
    #[arg(short = 's', long = "save-tables", default_value_t = false)]
    save_tables: bool,

    /// Output file type for saved tables
    #[arg(short = 'f', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,

    /// Number of threads to use for parallel processing (0 for all cores)
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args) {
    trace!("{args:?}");

    let pred_path = match Path::new(&args.pred).canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to retrieve the prediction file: {e}");
            std::process::exit(1);
        }
    };

    let (pred, pdb_warnings) = match load_model(&pred_path.to_string_lossy()) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    for e in &pdb_warnings {
        match e.level() {
            pdbtbx::ErrorLevel::BreakingError => error!("{e}"),
            pdbtbx::ErrorLevel::InvalidatingError => error!("{e}"),
            _ => warn!("{e}"),
        }
    }

    let truth_chains = match gather_truth_chains(&args.truth, args.pdb_id.as_deref(), &pred_path) {
        Ok(chains) => chains,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    debug!(
        pred_chains = pred.chain_count(),
        truth_chains = truth_chains.len(),
        "loaded complex"
    );

    let mapping = match run_with_threads(args.num_threads, || map_complex(&pred, truth_chains)) {
        Ok(mapping) => mapping,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let match_table = mapping.assignment.to_dataframe();
    println!("{match_table}");
    info!(
        rmsd = mapping.assignment.global_rmsd,
        contacts = mapping.contact_pairs.len(),
        "chain mapping finished"
    );
    if mapping.contact_pairs.is_empty() {
        warn!("no contacting chain pairs, nothing to forward to interface scoring");
    }

    if args.save_tables {
        let _ = std::fs::create_dir_all(&args.output);
        let tables = [
            ("info", mapping.candidates.to_dataframe()),
            ("match_table", match_table),
            ("contacts", mapping.contacts_dataframe()),
        ];
        for (name, mut df) in tables {
            let file = args.output.join(name);
            write_df_to_file(&mut df, &file, args.output_format);
            info!("Saved {name} table to {}", file.display());
        }
    }
}
