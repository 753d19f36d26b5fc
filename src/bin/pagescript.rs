use anyhow::Context;
use clap::{Parser, Subcommand};
use pagescript::bridge::HostBridge;
use pagescript::config::Config;
use pagescript::{CANNED_SCRIPTS, CannedScript, ScriptLibrary, ScriptStore, logging, open_store};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "pagescript", version, about = "Manage per-page custom scripts")]
struct Cli {
    /// Configuration file (defaults to ./pagescript.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the script stored for a URL
    Get { url: String },
    /// Store a script for a URL
    Set {
        url: String,
        #[arg(required_unless_present = "canned")]
        script: Option<String>,
        /// Use a script from the canned catalog instead
        #[arg(long, conflicts_with = "script")]
        canned: Option<usize>,
    },
    /// Delete the script stored for a URL
    Remove { url: String },
    /// List URLs that have a stored script
    List,
    /// Replace the stored library with an empty one
    Clear,
    /// Print the canned scripts
    Catalog,
    /// Run the host bridge on stdin/stdout
    Bridge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init_tracing(&config.logging)?;
    debug!(
        git_sha = pagescript::GIT_SHA.unwrap_or("unknown"),
        built = pagescript::BUILD_TIMESTAMP.unwrap_or("unknown"),
        "pagescript starting"
    );

    let store = open_store(&config.storage);

    match cli.command {
        Command::Get { url } => {
            let library = load_library(store.as_ref());
            println!("{}", library.get(&url).unwrap_or_default());
        }
        Command::Set {
            url,
            script,
            canned,
        } => {
            let script = match canned {
                Some(index) => CannedScript::try_from(index)?.script().to_string(),
                None => script.unwrap_or_default(),
            };
            store.update(&url, Some(&script))?;
        }
        Command::Remove { url } => {
            if store.update(&url, None)?.is_none() {
                info!(url = %url, "No script stored for URL");
            }
        }
        Command::List => {
            for entry in load_library(store.as_ref()).entries() {
                println!("{}\t{} bytes", entry.url, entry.script.len());
            }
        }
        Command::Clear => {
            store.save(&Default::default())?;
        }
        Command::Catalog => {
            for (index, script) in CANNED_SCRIPTS.iter().enumerate() {
                println!("{index}\t{script}");
            }
        }
        Command::Bridge => {
            let bridge = HostBridge::new(store);
            let reader = BufReader::new(tokio::io::stdin());
            let writer = tokio::io::stdout();

            tokio::select! {
                result = bridge.run(reader, writer) => {
                    let completed = result?;
                    info!(completed, "Host closed the bridge");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested, stopping bridge");
                }
            }
        }
    }

    Ok(())
}

/// Read the library for display; an unreadable one shows as empty.
fn load_library(store: &dyn ScriptStore) -> ScriptLibrary {
    let (library, error) = store.load_or_default();
    if let Some(e) = error {
        eprintln!("warning: {e}; showing an empty script library");
    }
    library
}
