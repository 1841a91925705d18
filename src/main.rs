//! threat-db: ingest CycloneDX SBOM/VEX manifests into a Dgraph threat database.

use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use threat_db::{
    cli::{self, exit_codes, OutputTarget},
    config::{self, AppConfig, Validatable},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "threat-db")]
#[command(version)]
#[command(about = "Normalize SBOM/VEX manifests and ingest them into a graph store", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  One or more manifests failed to ingest
    2  Store unavailable (health)
    3  Error occurred

EXAMPLES:
    # Ingest every *.vex.json under ./data once
    threat-db import --data-dir ./data

    # Keep ingesting new and changed manifests
    threat-db watch --data-dir ./data --interval 10s

    # Show what a manifest would submit
    threat-db normalize app.vex.json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Store connection flags shared by every command that talks to the store.
#[derive(Args, Default)]
struct StoreArgs {
    /// Dgraph GraphQL host
    #[arg(long, env = "DGRAPH_GRAPHQL_HOST")]
    host: Option<String>,

    /// Dgraph API key
    #[arg(long, env = "DGRAPH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Dgraph Cloud API key
    #[arg(long, env = "DGRAPH_CLOUD_API_KEY", hide_env_values = true)]
    cloud_api_key: Option<String>,

    /// Dgraph ACL access token
    #[arg(long, env = "DGRAPH_ACL_KEY", hide_env_values = true)]
    acl_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl StoreArgs {
    fn apply(self, config: &mut AppConfig) {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(host) = non_empty(self.host) {
            config.store.endpoint = host;
        }
        if let Some(key) = non_empty(self.api_key) {
            config.store.api_key = Some(key);
        }
        if let Some(key) = non_empty(self.cloud_api_key) {
            config.store.cloud_api_key = Some(key);
        }
        if let Some(key) = non_empty(self.acl_key) {
            config.store.acl_key = Some(key);
        }
        if let Some(secs) = self.timeout {
            config.store.timeout_secs = secs;
        }
    }
}

/// Arguments for the `import` subcommand
#[derive(Args)]
struct ImportArgs {
    /// Directory searched recursively for manifests
    #[arg(long, env = "THREATDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Delete each manifest once the store has accepted it
    #[arg(long)]
    remove_on_success: bool,

    /// Ingest one file at a time
    #[arg(long)]
    sequential: bool,

    #[command(flatten)]
    store: StoreArgs,
}

/// Arguments for the `watch` subcommand
#[derive(Args)]
struct WatchArgs {
    /// Directory monitored for manifests
    #[arg(long, env = "THREATDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Polling interval (e.g., 5s, 1m)
    #[arg(long)]
    interval: Option<String>,

    /// Wait after detecting a change before ingesting (e.g., 1s, 500ms)
    #[arg(long)]
    debounce: Option<String>,

    /// Delete each manifest once the store has accepted it
    #[arg(long)]
    remove_on_success: bool,

    /// Scan once, ingest what was found, then exit
    #[arg(long)]
    once: bool,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every manifest under a directory once
    Import(ImportArgs),

    /// Continuously ingest new and modified manifests
    Watch(WatchArgs),

    /// Check whether the store reports a healthy node
    Health {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the normalized submission for one manifest
    Normalize {
        /// Manifest to normalize
        file: PathBuf,

        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (defaults + file + environment)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Write an example config file
    Init {
        /// Destination (defaults to ~/.config/threat-db/threat-db.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the JSON Schema of the config file format
    Schema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            exit_codes::ERROR
        }
    };
    if exit_code != exit_codes::SUCCESS {
        std::process::exit(exit_code);
    }
}

fn run(cli: Cli) -> Result<i32> {
    let (mut app_config, loaded_from) = AppConfig::from_file_and_env(cli.config.as_deref());
    if let Some(path) = &loaded_from {
        tracing::debug!("Using config file {}", path.display());
    }

    let exit_code = match cli.command {
        Commands::Import(args) => {
            args.store.apply(&mut app_config);
            if let Some(dir) = args.data_dir {
                app_config.ingest.data_dir = dir;
            }
            if args.remove_on_success {
                app_config.ingest.remove_on_success = true;
            }
            if args.sequential {
                app_config.ingest.parallel = false;
            }
            ensure_valid(&app_config)?;
            cli::run_import(&app_config)?
        }

        Commands::Watch(args) => {
            args.store.apply(&mut app_config);
            if let Some(dir) = args.data_dir {
                app_config.ingest.data_dir = dir;
            }
            if let Some(interval) = args.interval {
                app_config.watch.interval = interval;
            }
            if let Some(debounce) = args.debounce {
                app_config.watch.debounce = debounce;
            }
            if args.remove_on_success {
                app_config.ingest.remove_on_success = true;
            }
            ensure_valid(&app_config)?;
            let mut watch = app_config.watch_config()?;
            watch.once = args.once;
            cli::run_watch(&app_config, &watch)?
        }

        Commands::Health { store } => {
            store.apply(&mut app_config);
            ensure_valid(&app_config)?;
            cli::run_health(&app_config, cli.quiet)?
        }

        Commands::Normalize { file, output } => {
            cli::run_normalize(&file, &OutputTarget::from_option(output), cli.quiet)?
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "threat-db", &mut io::stdout());
            exit_codes::SUCCESS
        }

        Commands::Config { action } => {
            run_config(action, &app_config, loaded_from, cli.config)?;
            exit_codes::SUCCESS
        }
    };
    Ok(exit_code)
}

/// Refuse to start with an invalid configuration, listing every problem.
fn ensure_valid(config: &AppConfig) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        tracing::error!("Invalid configuration: {error}");
    }
    bail!("{} configuration error(s)", errors.len())
}

fn run_config(
    action: ConfigAction,
    app_config: &AppConfig,
    loaded_from: Option<PathBuf>,
    explicit: Option<PathBuf>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            match &loaded_from {
                Some(path) => eprintln!("# Loaded from: {}", path.display()),
                None => eprintln!("# No config file found; showing defaults"),
            }
            let yaml = config::render_config(app_config).context("failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigAction::Path => {
            let search_paths = [
                std::env::current_dir().ok(),
                dirs::config_dir().map(|p| p.join("threat-db")),
                dirs::home_dir(),
            ];
            eprintln!("Config file search paths (in order):");
            for path in search_paths.into_iter().flatten() {
                eprintln!("  {}", path.display());
            }
            eprintln!();
            eprintln!("Recognized file names:");
            for name in config::CONFIG_FILE_NAMES {
                eprintln!("  {name}");
            }
            eprintln!();
            match config::discover_config_file(explicit.as_deref()) {
                Some(path) => eprintln!("Active config file: {}", path.display()),
                None => eprintln!("No config file found."),
            }
        }
        ConfigAction::Init { output } => {
            let target = output.unwrap_or_else(config::default_config_path);
            if target.exists() {
                bail!(
                    "{} already exists. Remove it first to re-initialize.",
                    target.display()
                );
            }
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&target, config::generate_example_config())
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Created {}", target.display());
        }
        ConfigAction::Schema { output } => {
            let schema = config::generate_json_schema().context("failed to render schema")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_flags_override_config() {
        let cli = Cli::try_parse_from([
            "threat-db",
            "import",
            "--data-dir",
            "/tmp/manifests",
            "--sequential",
            "--host",
            "http://graph:8080",
        ])
        .unwrap();
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        let mut config = AppConfig::default();
        args.store.apply(&mut config);
        assert_eq!(config.store.endpoint, "http://graph:8080");
        assert!(args.sequential);
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/manifests")));
    }
}
