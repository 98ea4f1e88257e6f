//! # Pathway CLI Module
//!
//! This module implements the CLI interface for Pathway.
//!
//! ## Available Commands
//!
//! Local file editing:
//! - `init` - Write a new workflow holding only an entry and an exit
//! - `show` - Nodes with their editing state, edges and open issues
//! - `validate` - Report every structural problem
//! - `add-exercise`, `add-condition`, `add-exit` - Insert nodes
//! - `connect`, `disconnect` - Wire and unwire nodes
//! - `retitle`, `move`, `remove` - Edit single nodes
//! - `kinds` - List node types and kinds
//! - `hash` - Checksum and BLAKE3 digest of a document, optionally checked
//!   against a recorded checksum
//!
//! Storage backend:
//! - `push` - Validate a local file and store it under an id
//! - `pull` - Write a stored workflow to a local file
//! - `list` - Stored workflow ids
//! - `serve` - Start the HTTP storage API

mod commands;

use clap::{Parser, Subcommand};
use pathway::config::Config;
use pathway_core::PathwayError;
use std::path::{Path, PathBuf};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pathway - Learning Workflow Designer
///
/// Author learning workflows as graphs of exercises and scored conditions.
#[derive(Parser, Debug)]
#[command(name = "pathway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: pathway.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend: "memory", "redb" or "dir" (overrides the config file)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Path to the database file or directory (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether this invocation starts the server.
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new workflow file with one entry and one exit
    Init {
        /// Workflow file to create
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show nodes, their editing state, edges and open issues
    Show {
        /// Workflow file
        file: PathBuf,
    },

    /// Validate a workflow file (exit status 2 when invalid)
    Validate {
        /// Workflow file
        file: PathBuf,
    },

    /// Insert an exercise node
    AddExercise {
        /// Workflow file
        file: PathBuf,

        /// Exercise kind, e.g. "listening" or "grammar"
        #[arg(short, long)]
        kind: String,

        /// Node label
        #[arg(short, long)]
        label: String,

        /// Canvas x position
        #[arg(short, long, default_value = "0")]
        x: f64,

        /// Canvas y position
        #[arg(short, long, default_value = "0")]
        y: f64,
    },

    /// Insert a condition node
    AddCondition {
        /// Workflow file
        file: PathBuf,

        /// Condition kind, e.g. "score-threshold"
        #[arg(short, long)]
        kind: String,

        /// Condition expression, e.g. "score >= 70"
        #[arg(short, long)]
        expression: String,

        /// Node label
        #[arg(short, long)]
        label: String,

        /// Canvas x position
        #[arg(short, long, default_value = "0")]
        x: f64,

        /// Canvas y position
        #[arg(short, long, default_value = "0")]
        y: f64,
    },

    /// Insert an exit node
    AddExit {
        /// Workflow file
        file: PathBuf,

        /// Node label
        #[arg(short, long)]
        label: String,

        /// Canvas x position
        #[arg(short, long, default_value = "0")]
        x: f64,

        /// Canvas y position
        #[arg(short, long, default_value = "0")]
        y: f64,
    },

    /// Connect two nodes
    Connect {
        /// Workflow file
        file: PathBuf,

        /// Source node id
        from: String,

        /// Target node id
        to: String,

        /// Branch label ("pass" or "fail"), required from a condition
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Remove an edge
    Disconnect {
        /// Workflow file
        file: PathBuf,

        /// Edge id
        edge: String,
    },

    /// Change a node's label
    Retitle {
        /// Workflow file
        file: PathBuf,

        /// Node id
        node: String,

        /// New label
        label: String,
    },

    /// Move a node on the canvas
    Move {
        /// Workflow file
        file: PathBuf,

        /// Node id
        node: String,

        /// Canvas x position
        #[arg(short, long)]
        x: f64,

        /// Canvas y position
        #[arg(short, long)]
        y: f64,
    },

    /// Remove a node and every edge touching it
    Remove {
        /// Workflow file
        file: PathBuf,

        /// Node id
        node: String,
    },

    /// List node types, exercise kinds and condition kinds
    Kinds,

    /// Validate a workflow file and store it (exit status 2 when blocked)
    Push {
        /// Workflow file
        file: PathBuf,

        /// Workflow id to store it under
        id: String,
    },

    /// Write a stored workflow to a local file
    Pull {
        /// Workflow id
        id: String,

        /// Output file
        file: PathBuf,
    },

    /// List stored workflow ids
    List,

    /// Compute the checksum and BLAKE3 digest of a workflow file
    /// (exit status 2 when --expect does not match)
    Hash {
        /// Workflow file
        file: PathBuf,

        /// Checksum recorded earlier, as 16 hex digits
        #[arg(short, long, value_parser = parse_checksum)]
        expect: Option<u64>,
    },

    /// Start the HTTP storage API
    Serve {
        /// Host to bind to (default from config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// `Ok(false)` means the command ran but the workflow it checked is not
/// valid; the caller turns that into a non-zero exit status.
pub async fn execute(cli: Cli) -> Result<bool, PathwayError> {
    let Cli {
        config,
        backend,
        database,
        json_mode,
        quiet: _,
        command,
    } = cli;

    match command {
        Commands::Init { file, force } => cmd_init(&file, force, json_mode).map(|()| true),
        Commands::Show { file } => cmd_show(&file, json_mode).map(|()| true),
        Commands::Validate { file } => cmd_validate(&file, json_mode),
        Commands::AddExercise {
            file,
            kind,
            label,
            x,
            y,
        } => cmd_add_exercise(&file, &kind, &label, x, y, json_mode).map(|()| true),
        Commands::AddCondition {
            file,
            kind,
            expression,
            label,
            x,
            y,
        } => cmd_add_condition(&file, &kind, &expression, &label, x, y, json_mode)
            .map(|()| true),
        Commands::AddExit { file, label, x, y } => {
            cmd_add_exit(&file, &label, x, y, json_mode).map(|()| true)
        }
        Commands::Connect {
            file,
            from,
            to,
            label,
        } => cmd_connect(&file, &from, &to, label.as_deref(), json_mode).map(|()| true),
        Commands::Disconnect { file, edge } => {
            cmd_disconnect(&file, &edge, json_mode).map(|()| true)
        }
        Commands::Retitle { file, node, label } => {
            cmd_retitle(&file, &node, &label, json_mode).map(|()| true)
        }
        Commands::Move { file, node, x, y } => {
            cmd_move(&file, &node, x, y, json_mode).map(|()| true)
        }
        Commands::Remove { file, node } => cmd_remove(&file, &node, json_mode).map(|()| true),
        Commands::Kinds => {
            cmd_kinds(json_mode);
            Ok(true)
        }
        Commands::Hash { file, expect } => cmd_hash(&file, expect, json_mode),
        Commands::Push { file, id } => {
            let config = resolve_config(config.as_deref(), backend, database)?;
            cmd_push(&config, &file, &id, json_mode)
        }
        Commands::Pull { id, file } => {
            let config = resolve_config(config.as_deref(), backend, database)?;
            cmd_pull(&config, &id, &file, json_mode).map(|()| true)
        }
        Commands::List => {
            let config = resolve_config(config.as_deref(), backend, database)?;
            cmd_list(&config, json_mode).map(|()| true)
        }
        Commands::Serve { host, port } => {
            let mut config = resolve_config(config.as_deref(), backend, database)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_serve(config).await.map(|()| true)
        }
    }
}

/// Parse a checksum as printed by `hash`, with or without a `0x` prefix.
fn parse_checksum(raw: &str) -> Result<u64, String> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid checksum {:?}: {}", raw, e))
}

/// Load the config file and environment, then apply the storage flags.
fn resolve_config(
    path: Option<&Path>,
    backend: Option<String>,
    database: Option<PathBuf>,
) -> Result<Config, PathwayError> {
    let mut config = Config::load(path)?;
    if let Some(backend) = backend {
        config.storage.backend = backend;
    }
    if let Some(database) = database {
        config.storage.path = database;
    }
    Ok(config)
}
