mod commands;
mod console;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use llamaup_core::{Config, ConfigError, ManagerError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use commands::Settings;

#[derive(Parser)]
#[command(name = "manage-models")]
#[command(author, version, about = "Find, download and manage local GGUF models", long_about = None)]
struct Cli {
    /// Install root (default: $LLAMAUP_HOME, then the config file, then ~/.llamaup)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Maximum number of repositories per search
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the file of a registered model
    Pull {
        /// Registry name (see `list`)
        model: String,
    },

    /// List registered models and their download state
    #[command(alias = "ls")]
    List,

    /// Delete the downloaded file of a model (the registry entry is kept)
    #[command(alias = "rm")]
    Remove {
        /// Registry name
        model: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show details of a registered model
    Info {
        /// Registry name
        model: String,
    },

    /// Search the hub for GGUF repositories
    Search {
        /// Search terms
        term: Vec<String>,
    },

    /// Interactively search, pick a file, download and register it
    Browse {
        /// Search terms (prompted for when omitted)
        term: Vec<String>,
    },

    /// Delete partial downloads left by interrupted runs
    Clean,

    /// View or set configuration
    Config {
        /// Config key (e.g., "hub.endpoint", "models.search_limit")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = config_or_default(Config::load(), cli.root.as_deref())?;
    let settings = Settings {
        config,
        root: cli.root,
        limit: cli.limit,
    };

    match cli.command {
        Commands::Pull { model } => commands::pull::execute(&settings, &model).await,
        Commands::List => commands::list::execute(&settings).await,
        Commands::Remove { model, yes } => commands::remove::execute(&settings, &model, yes).await,
        Commands::Info { model } => commands::info::execute(&settings, &model).await,
        Commands::Search { term } => commands::search::execute(&settings, &term.join(" ")).await,
        Commands::Browse { term } => {
            let term = term.join(" ");
            commands::browse::execute(&settings, Some(term.as_str()).filter(|t| !t.trim().is_empty()))
                .await
        }
        Commands::Clean => commands::clean::execute(&settings).await,
        Commands::Config { key, value } => {
            commands::config::execute(settings.config, key.as_deref(), value.as_deref()).await
        }
    }
}

/// Without a home directory there is no config file, which is fine as long
/// as the install root was given explicitly.
fn config_or_default(
    loaded: Result<Config, ConfigError>,
    root: Option<&Path>,
) -> Result<Config, ConfigError> {
    match loaded {
        Err(ConfigError::NoHome) if root.is_some() => {
            tracing::debug!("no home directory, using default config");
            Ok(Config::default())
        }
        other => other,
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ManagerError>() {
        Some(manager_err) => {
            eprintln!("error: {manager_err}");
            if let Some(hint) = manager_err.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(manager_err.exit_code() as u8)
        }
        None => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_aliases_and_globals() {
        let cli = Cli::try_parse_from(["manage-models", "rm", "llama3", "--yes", "--root", "/tmp/x", "-vv"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Commands::Remove { ref model, yes: true } if model == "llama3"));

        let cli = Cli::try_parse_from(["manage-models", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_search_terms_are_joined() {
        let cli = Cli::try_parse_from(["manage-models", "search", "tiny", "llama", "--limit", "5"]).unwrap();
        assert_eq!(cli.limit, Some(5));
        match cli.command {
            Commands::Search { term } => assert_eq!(term.join(" "), "tiny llama"),
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_missing_home_with_root_uses_defaults() {
        let config = config_or_default(Err(ConfigError::NoHome), Some(Path::new("/srv/llama"))).unwrap();
        assert_eq!(config.models.search_limit, 20);

        let result = config_or_default(Err(ConfigError::NoHome), None);
        assert!(matches!(result, Err(ConfigError::NoHome)));
    }

    #[test]
    fn test_usage_exit_code() {
        let err = anyhow::Error::from(ManagerError::Usage("search term must not be empty".into()));
        assert_eq!(report(&err), ExitCode::from(2));
    }
}
