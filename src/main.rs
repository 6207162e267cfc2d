//! Urban Researcher CLI - configuration and project management
//!
//! Run with `urban-cli --help` for usage.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use urban_cli::{
    APP_NAME, VERSION,
    config::{ConfigStore, Entry, Environment, Settings, mask},
    logging, output,
    project::{ProjectManager, STANDARD_DIRS},
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Urban Researcher: CLI for AI-assisted urban research")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose logging (DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config store file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration values (API keys etc.)
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Initialize a new project
    Init {
        /// Project name
        name: String,

        /// Project directory (default: ./<name>)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Project utilities
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Store a value
    Set {
        /// Key name (e.g. api-key)
        #[arg(long)]
        key: String,

        /// Value to store
        #[arg(long)]
        value: String,
    },

    /// Print the effective value of a key
    Get {
        /// Key name (e.g. api-key)
        #[arg(long)]
        key: String,

        /// Mask the middle of the value
        #[arg(long)]
        mask: bool,

        /// Fail instead of printing <unset> when the key has no value
        #[arg(long)]
        strict: bool,
    },

    /// List all stored keys with their effective values (masked)
    List {
        /// Print values without masking
        #[arg(long)]
        raw: bool,
    },

    /// Remove a stored key
    Unset {
        /// Key name (e.g. api-key)
        #[arg(long)]
        key: String,
    },

    /// Show file locations and effective settings
    Info,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Check a project's metadata and layout
    Status {
        /// Project root
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

fn run_config(command: ConfigCommand, store_override: Option<PathBuf>) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(path) = store_override {
        settings.config_file = Some(path);
    }

    let store = ConfigStore::from_settings(&settings, Environment::from_process())?;
    debug!("Using config store {}", store.path().display());

    match command {
        ConfigCommand::Set { key, value } => {
            store.set(&key, &value)?;
            println!("Saved: {}", key);
        }

        ConfigCommand::Get {
            key,
            mask: masked,
            strict,
        } => {
            let resolved = if strict {
                Some(store.require(&key)?)
            } else {
                store.get(&key)?
            };

            match resolved {
                Some(resolved) => {
                    debug!("'{}' resolved from {}", key, resolved.source);
                    if masked {
                        println!("{}", mask(&resolved.value, settings.mask_keep));
                    } else {
                        println!("{}", resolved.value);
                    }
                }
                None => println!("<unset>"),
            }
        }

        ConfigCommand::List { raw } => {
            let entries: Vec<Entry> = store.list()?.collect();
            let mask_keep = (!raw).then_some(settings.mask_keep);
            println!("{}", output::render_entries(&entries, mask_keep));
        }

        ConfigCommand::Unset { key } => {
            if store.unset(&key)? {
                println!("Removed: {}", key);
            } else {
                println!("Not set: {}", key);
            }
        }

        ConfigCommand::Info => {
            println!("Config store:  {}", store.path().display());
            println!("Settings file: {}", Settings::settings_file_path()?.display());
            println!("Env override:  {}<KEY>", settings.env_prefix);
            println!();
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        // Only config commands depend on tool settings
        Commands::Config { command } => run_config(command, cli.config)?,

        Commands::Init { name, dir } => {
            let manager = ProjectManager::from_current_dir()?;
            let root = manager.init(&name, dir.as_deref())?;

            let layout: Vec<String> = STANDARD_DIRS.iter().map(|d| format!("{d}/")).collect();
            println!("Created project at: {}", root.display());
            println!("Standard layout: {}", layout.join(", "));
        }

        Commands::Project {
            command: ProjectCommand::Status { dir },
        } => {
            let manager = ProjectManager::from_current_dir()?;
            let status = manager.status(&dir)?;
            println!("{}", output::render_status(&status));
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Messages already embed their cause; keep it to one line
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
