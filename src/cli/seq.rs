use chainmap::{load_model, ChainExt};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Structure files whose gap-closed sequences should be printed
    input: Vec<PathBuf>,
}

pub(crate) fn run(args: &Args) {
    for f in &args.input {
        let input_path = match Path::new(f).canonicalize() {
            Ok(path) => path,
            Err(e) => {
                error!("Failed to retrieve input file {}: {e}", f.display());
                continue;
            }
        };

        let (pdb, _) = match load_model(&input_path.to_string_lossy()) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("{e}");
                continue;
            }
        };
        println!("File: {}", input_path.display());
        for chain in pdb.chains() {
            println!(">{}\n{}", chain.id(), chain.close_gaps().pdb_seq());
        }
        println!();
    }
}
