use std::path::PathBuf;

use clap::Parser;
use clinicdb_repl::{EditModeChoice, ShellContext};

/// clinicdb - interactive shell for a realtime clinic store
#[derive(Parser, Debug)]
#[command(name = "clinicdb")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store config file (JSON: access rules and seed data)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON file loaded at the root of the store; replaces the config's seed
    #[arg(long, value_name = "FILE")]
    seed: Option<PathBuf>,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,
}

fn main() {
    let args = Args::parse();

    let edit_mode = if args.vi {
        Some(EditModeChoice::Vi)
    } else if args.emacs {
        Some(EditModeChoice::Emacs)
    } else {
        None
    };

    let ctx = match ShellContext::load(args.config.as_deref(), args.seed.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let label = match (&args.config, &args.seed) {
        (Some(path), _) | (None, Some(path)) => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "memory".to_string()),
        (None, None) => "memory".to_string(),
    };

    if let Err(e) = clinicdb_repl::run(ctx, label, edit_mode) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
