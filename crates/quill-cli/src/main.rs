mod app;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quill", version, about = "Hotkey dictation: microphone to text")]
struct Cli {
    /// Print verbose diagnostics
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for activation keys and dictate (default)
    Listen,
    /// Show or change configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    quill_core::set_verbose(cli.verbose);

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => commands::listen::run(),
        Command::Config(args) => commands::config::run(args),
    }
}
