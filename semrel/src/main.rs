mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use semrel_core::Environment;
use tracing::Level;

#[derive(Parser)]
#[command(name = "semrel")]
#[command(about = "Fully automated package releases driven by commit history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory containing package.json.
    #[arg(long, default_value = ".")]
    cwd: PathBuf,

    /// Compute and verify the release without writing or publishing anything.
    #[arg(long, action)]
    debug: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Determine the next version and write it to package.json.
    Pre,
    /// Publish release notes for the version in package.json.
    Post,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let env = Environment::from_process();

    let result = match cli.command {
        Commands::Pre => commands::cmd_pre(&cli.cwd, &env, cli.debug).await,
        Commands::Post => commands::cmd_post(&cli.cwd, &env, cli.debug).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<semrel_core::Error>() {
                Some(core) if core.is_no_relevant_changes() => {
                    eprintln!("{} {}", "semrel:".yellow().bold(), core);
                }
                _ => eprintln!("{} {:?}", "Error:".red().bold(), err),
            }
            ExitCode::FAILURE
        }
    }
}
