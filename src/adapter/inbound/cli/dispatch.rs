//! Routes a parsed command line to its handler.

use crate::adapter::inbound::cli::command::{CheckCommand, Cli, Commands};
use crate::adapter::inbound::cli::{blacklist, check, output, run};
use crate::error::Result;

/// Apply global output flags and run the selected command.
pub async fn dispatch(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(CheckCommand::Config(arg)) => check::execute_config(&arg.config),
        Commands::Check(CheckCommand::Store(arg)) => check::execute_store(&arg.config).await,
        Commands::Blacklist(args) => blacklist::execute(&args).await,
    }
}
