//! dhtvault - Content-addressed chunked file archiver
//!
//! Usage:
//!   dhtvault init                 - Write a default configuration file
//!   dhtvault run                  - Start a node and enter the command loop
//!
//! Inside the command loop:
//!   store <path>    - Chunk a file into the store and write its manifest
//!   restore <path>  - Restore a file from a manifest
//!   put <key> <value> / get <key> - Raw store access

use clap::{Parser, Subcommand};
use dhtvault::{
    archive,
    chunk::ChunkId,
    config::Config,
    manifest,
    store::{ChunkStore, MemoryStore},
    Result,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "dhtvault")]
#[command(author = "dhtvault Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Content-addressed chunked file archiver on a distributed key-value store")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.config/dhtvault/config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Port this node should bind to
        #[arg(long)]
        port: Option<u16>,

        /// host:port of a known node to join through
        #[arg(long)]
        bootstrap: Option<String>,
    },

    /// Start a node and enter the interactive command loop
    Run,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let config_path = expand_tilde(&cli.config);

    if let Err(e) = run_command(cli.command, &config_path) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config_path: &Path) -> Result<()> {
    match command {
        Commands::Init { port, bootstrap } => cmd_init(config_path, port, bootstrap),
        Commands::Run => cmd_run(config_path),
    }
}

fn cmd_init(config_path: &Path, port: Option<u16>, bootstrap: Option<String>) -> Result<()> {
    let mut config = Config::default();
    if let Some(port) = port {
        config.node.port = port;
    }
    config.node.bootstrap = bootstrap;
    config.validate()?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(config_path)?;

    info!("Configuration saved to {:?}", config_path);
    info!("Run 'dhtvault run' to start a node");
    Ok(())
}

fn cmd_run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;

    match &config.node.bootstrap {
        Some(addr) => info!(
            port = config.node.port,
            bootstrap = %addr,
            "starting node, joining existing network"
        ),
        None => info!(
            port = config.node.port,
            peer_discovery = config.node.peer_discovery,
            "starting node as bootstrap"
        ),
    }

    // One store handle for the whole session; every command borrows it.
    // A networked deployment swaps in a DHT-backed ChunkStore here.
    let store: Arc<dyn ChunkStore> = Arc::new(MemoryStore::new(config.node.storage_limit));
    let runtime = tokio::runtime::Runtime::new()?;

    println!("Node started. Use 'help' to get a help dialog.");
    repl(store.as_ref(), &config, &runtime)
}

fn repl(store: &dyn ChunkStore, config: &Config, runtime: &tokio::runtime::Runtime) -> Result<()> {
    let stdin = std::io::stdin();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            ["exit"] | ["quit"] => break,
            ["help"] => print_help(),
            ["store", path] => cmd_store(store, config, runtime, Path::new(path)),
            ["restore", path] => cmd_restore(store, Path::new(path)),
            ["put", key, value @ ..] if !value.is_empty() => {
                cmd_put(store, runtime, key, &value.join(" "))
            }
            ["get", key] => cmd_get(store, key),
            ["store", ..] => println!("usage: store <path>"),
            ["restore", ..] => println!("usage: restore <path>"),
            ["put", ..] => println!("usage: put <key> <value>"),
            ["get", ..] => println!("usage: get <key>"),
            [cmd, ..] => println!("Unknown command '{}'. Use 'help' for a list.", cmd),
        }
    }

    Ok(())
}

fn print_help() {
    println!("store <path>      - Split a file into chunks, store them, and write a manifest.");
    println!("restore <path>    - Restore the original file from a .{} manifest.", manifest::MANIFEST_EXTENSION);
    println!("put <key> <value> - Put a raw key value pair into the store.");
    println!("get <key>         - Retrieve the values found under the given key.");
    println!("help              - Print this help message.");
    println!("exit              - Stop the node and exit the program.");
    println!("quit              - Same as exit.");
}

fn cmd_store(
    store: &dyn ChunkStore,
    config: &Config,
    runtime: &tokio::runtime::Runtime,
    path: &Path,
) {
    let result = runtime.block_on(archive::store_file(store, path, config.chunk.chunk_size));
    match result {
        Ok(receipt) => {
            // Dropping the receipt keeps puts fire-and-forget; their
            // completions are logged as they arrive.
            println!(
                "Submitted {} chunks. Manifest saved under '{}'.",
                receipt.chunk_count,
                receipt.manifest_path.display()
            );
        }
        Err(e) => println!("Couldn't store the file: {}", e),
    }
}

fn cmd_restore(store: &dyn ChunkStore, path: &Path) {
    match archive::restore_file(store, path) {
        Ok(bytes) => match manifest::restore_target(path) {
            Ok(target) => println!("Restored {} bytes to '{}'.", bytes, target.display()),
            Err(_) => println!("Restored {} bytes.", bytes),
        },
        Err(e) => println!("Couldn't restore the file: {}", e),
    }
}

fn cmd_put(store: &dyn ChunkStore, runtime: &tokio::runtime::Runtime, key: &str, value: &str) {
    // Raw values are addressed by the hash of the key string, so
    // lookups need only the key the user typed
    let id = ChunkId::from_data(key.as_bytes());
    let confirmation = store.put(&id, value.as_bytes().to_vec());

    runtime.spawn(async move {
        if confirmation.await.unwrap_or(false) {
            info!(key = %id, "put finished with success");
        } else {
            warn!(key = %id, "put finished with failure");
        }
    });
}

fn cmd_get(store: &dyn ChunkStore, key: &str) {
    let id = ChunkId::from_data(key.as_bytes());
    match store.get(&id) {
        Ok(values) if values.is_empty() => println!("No values found under '{}'.", key),
        Ok(values) => {
            for value in values {
                println!("Got value: {}", String::from_utf8_lossy(&value));
            }
        }
        Err(e) => println!("Lookup failed: {}", e),
    }
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            if let Ok(rest) = path.strip_prefix("~") {
                return home.join(rest);
            }
        }
    }
    path.to_path_buf()
}
