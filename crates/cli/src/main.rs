use anyhow::Context;
use clap::{Parser, Subcommand};

use bookshelf_kernel::settings::Settings;

/// Operator commands for the bookshelf service
#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations and serve the HTTP API until Ctrl-C
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the effective configuration as JSON, secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command {
        Command::Serve => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "bookshelf-cli serve");
            bookshelf_app::serve(settings).await
        }
        Command::Migrate => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            bookshelf_app::migrate(settings).await?;
            tracing::info!("bookshelf-cli migrate finished");
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings.redacted())
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["bookshelf-cli", "migrate"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate));
        assert!(Cli::try_parse_from(["bookshelf-cli", "shelve"]).is_err());
    }
}
