//! yakv CLI
//!
//! Offline inspection of transaction log files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use yakv::wal::{LogReader, Recovery};

/// yakv CLI
#[derive(Parser, Debug)]
#[command(name = "yakv-cli")]
#[command(about = "Inspect yakv transaction logs")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a log into a scratch store and report what it holds
    Verify {
        /// The transaction log to check
        file: PathBuf,
    },

    /// Print every event of a log
    Dump {
        /// The transaction log to print
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match args.command {
        Commands::Verify { file } => match Recovery::verify(&file) {
            Ok(result) => {
                println!("{}: ok", file.display());
                println!("  events:  {} ({} put, {} delete)", result.events_replayed, result.puts, result.deletes);
                println!("  keys:    {}", result.keys);
                println!("  last id: {}", result.last_id);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", file.display(), e);
                ExitCode::FAILURE
            }
        },
        Commands::Dump { file } => {
            let reader = match LogReader::open(&file) {
                Ok(reader) => reader,
                Err(e) => {
                    eprintln!("{}: {}", file.display(), e);
                    return ExitCode::FAILURE;
                }
            };

            for item in reader {
                match item {
                    Ok(event) => println!("{}", event),
                    Err(e) => {
                        eprintln!("{}: {}", file.display(), e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
    }
}
