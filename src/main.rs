//! jirabridge - Bidirectional Jira sync bridge
//!
//! Main entry point for the jirabridge CLI.

use clap::{Parser, Subcommand};
use jirabridge::config::{validate_config, BridgeConfig};
use jirabridge::server::WebhookServer;
use jirabridge::store::MappingStore;
use jirabridge::sync::{Direction, SyncEngine};
use jirabridge::BridgeError;
use std::path::{Path, PathBuf};
use std::process;

/// jirabridge - Relay issues, comments, worklogs and attachments between two Jira instances
#[derive(Parser, Debug)]
#[command(name = "jirabridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/jirabridge/config.yaml)
    #[arg(short, long, env = "JIRABRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Check the configuration for errors
    Validate,

    /// Run the webhook listener
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List stored issue mappings
    Mappings {
        /// List attachment mappings instead
        #[arg(long)]
        attachments: bool,
    },

    /// Record a correspondence between two existing issues
    Link {
        /// Issue key on tracker A
        key_a: String,

        /// Issue key on tracker B
        key_b: String,
    },
}

fn main() {
    if let Err(e) = jirabridge::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> jirabridge::Result<()> {
    let config_file = cli.config.unwrap_or_else(BridgeConfig::default_path);

    match cli.command {
        Commands::Init { force } => handle_init_command(&config_file, force),
        Commands::Validate => handle_validate_command(&load_config(&config_file)?),
        Commands::Serve { bind } => handle_serve_command(load_config(&config_file)?, bind),
        Commands::Mappings { attachments } => {
            handle_mappings_command(&load_config(&config_file)?, attachments)
        }
        Commands::Link { key_a, key_b } => {
            handle_link_command(&load_config(&config_file)?, &key_a, &key_b)
        }
    }
}

fn load_config(config_file: &Path) -> jirabridge::Result<BridgeConfig> {
    match BridgeConfig::load(config_file) {
        Ok(config) => Ok(config),
        Err(BridgeError::Config(msg)) if msg.contains("Config file not found") => {
            Err(BridgeError::Config(format!(
                "No configuration found at {}. Run 'jirabridge init' first to create one.",
                config_file.display()
            )))
        }
        Err(e) => Err(e),
    }
}

fn handle_init_command(config_file: &Path, force: bool) -> jirabridge::Result<()> {
    if config_file.exists() && !force {
        println!("Configuration already exists at {}", config_file.display());
        println!();
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    let config = BridgeConfig::sample();
    config.save(config_file)?;

    println!("✓ Created configuration at {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the tracker URLs and project keys");
    println!("  2. Export the tokens:");
    println!("     export JIRA_A_TOKEN=...");
    println!("     export JIRA_B_TOKEN=...");
    println!("  3. Point each Jira's webhook at this bridge:");
    for direction in Direction::ALL {
        println!(
            "     Jira {}: http://<host>:<port>{}",
            direction.source_label(),
            jirabridge::server::webhook_path(direction)
        );
    }
    println!("  4. Start the listener:");
    println!("     jirabridge serve");

    Ok(())
}

fn handle_validate_command(config: &BridgeConfig) -> jirabridge::Result<()> {
    for endpoint in [&config.tracker_a, &config.tracker_b] {
        if endpoint.resolve_token().is_none() {
            println!(
                "⚠ Tracker {}: token variable {} is not set",
                endpoint.name,
                endpoint.token_env_var().unwrap_or_default()
            );
        }
    }

    match validate_config(config) {
        Ok(()) => {
            println!("✓ Configuration is valid");
            println!("  Tracker A: {} ({})", config.tracker_a.base_url(), config.tracker_a.project_key);
            println!("  Tracker B: {} ({})", config.tracker_b.base_url(), config.tracker_b.project_key);
            println!("  Database:  {}", config.storage.path.display());
            Ok(())
        }
        Err(errors) => {
            println!("✗ Configuration has {} error(s):", errors.len());
            for error in &errors {
                println!("  - {}", error);
            }
            Err(BridgeError::Config("Invalid configuration".to_string()))
        }
    }
}

fn handle_serve_command(mut config: BridgeConfig, bind: Option<String>) -> jirabridge::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    jirabridge::config::validate_config_result(&config)?;

    let engine = SyncEngine::from_config(&config)?;
    let server = WebhookServer::new(engine, config.server.clone());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(server.run(&config.server.bind))
        .map_err(|e| BridgeError::Network(e.to_string()))
}

fn handle_mappings_command(config: &BridgeConfig, attachments: bool) -> jirabridge::Result<()> {
    let store = MappingStore::open(&config.storage.path)?;

    if attachments {
        let mappings = store.list_attachment_mappings()?;
        println!("Found {} attachment mappings:", mappings.len());
        println!();
        for m in mappings {
            println!(
                "  {} {}#{} -> {} {}#{}",
                m.source_url,
                m.source_issue_key,
                m.source_attachment_id,
                m.dest_url,
                m.dest_issue_key,
                if m.dest_attachment_id.is_empty() { "?" } else { m.dest_attachment_id.as_str() }
            );
        }
        return Ok(());
    }

    let mappings = store.list_issue_mappings()?;
    println!("Found {} issue mappings:", mappings.len());
    println!();
    for m in mappings {
        println!("  {:<16} <-> {:<16} {}", m.key_a, m.key_b, m.created_at);
    }

    Ok(())
}

fn handle_link_command(config: &BridgeConfig, key_a: &str, key_b: &str) -> jirabridge::Result<()> {
    let store = MappingStore::open(&config.storage.path)?;

    if store.insert_issue_mapping_if_absent(key_a, key_b)? {
        println!("✓ Linked {} (A) <-> {} (B)", key_a, key_b);
        return Ok(());
    }

    let existing_b = store.lookup_dest_issue(key_a, Direction::AToB)?;
    let existing_a = store.lookup_dest_issue(key_b, Direction::BToA)?;
    Err(BridgeError::Storage(format!(
        "Already linked: {} -> {}, {} -> {}",
        key_a,
        existing_b.as_deref().unwrap_or("-"),
        key_b,
        existing_a.as_deref().unwrap_or("-")
    )))
}
