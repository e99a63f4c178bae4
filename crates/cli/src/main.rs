//! `recto`: pull vendor, date and total out of receipt scans.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Receipt scanner - extract vendor, date and total from receipt images
#[derive(Parser, Debug)]
#[command(name = "recto")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline over one or more receipt images
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Also write each normalized image into this directory
        #[arg(long, value_name = "DIR")]
        save_preprocessed: Option<PathBuf>,
    },

    /// Extract fields from a text transcript, one recognized line per line
    Extract { transcript: PathBuf },

    /// Write the normalized version of an image
    Preprocess { src: PathBuf, dest: PathBuf },

    /// Print grayscale statistics and the recipe an image would get
    Classify { image: PathBuf },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries JSON results; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { images, save_preprocessed } => {
            commands::scan(&config, &images, save_preprocessed.as_deref())
        }
        Commands::Extract { transcript } => {
            let fields = commands::extract_transcript(&transcript)?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }
        Commands::Preprocess { src, dest } => commands::preprocess(&config, &src, &dest),
        Commands::Classify { image } => commands::classify(&config, &image),
    }
}
