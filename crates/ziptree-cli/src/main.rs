use std::path::PathBuf;
use std::process;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ziptree")]
#[command(author, version, about = "Mirror a ZIP archive's tree into a destination directory", long_about = None)]
struct Cli {
    /// Archive file to extract
    archive: PathBuf,

    /// Destination directory (created if absent, parents included)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("Error: {}", e);
            process::exit(map_error_to_exit_code(&e));
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // parameter validation happens before any archive or destination I/O
    if !cli.archive.exists() {
        bail!("the source archive {:?} cannot be found", cli.archive);
    }
    if cli.output.is_file() {
        bail!(
            "the destination directory points to a file: {:?}",
            cli.output
        );
    }

    info!("Extracting archive: {:?}", cli.archive);

    let summary = ziptree_core::extract_archive(&cli.archive, &cli.output)?;

    info!(
        "Extraction complete: {} directories, {} files, {} bytes",
        summary.dirs_created, summary.files_extracted, summary.bytes_copied
    );

    Ok(())
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: Archive cannot be opened
/// - 3: Invalid arguments
/// - 4: Extraction failure
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<ziptree_core::Error>() {
        match core_err {
            ziptree_core::Error::Open { .. } => 2,
            ziptree_core::Error::Read { .. }
            | ziptree_core::Error::DirectoryCreate { .. }
            | ziptree_core::Error::Copy { .. } => 4,
        }
    } else if err.to_string().contains("cannot be found")
        || err.to_string().contains("points to a file")
    {
        3
    } else {
        1
    }
}
