//! # Pathway - Learning Workflow Designer Backend
//!
//! The main binary for Pathway.
//!
//! This application provides:
//! - CLI editing of workflow documents stored as local JSON files
//! - Push/pull between local files and the configured storage backend
//! - HTTP storage API server (axum-based) for the visual editor
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               apps/pathway (THE BINARY)             │
//! │                                                     │
//! │     ┌─────────────┐          ┌─────────────┐        │
//! │     │    CLI      │          │  HTTP API   │        │
//! │     │   (clap)    │          │   (axum)    │        │
//! │     └──────┬──────┘          └──────┬──────┘        │
//! │            └────────────┬───────────┘               │
//! │                         ▼                           │
//! │                 ┌───────────────┐                   │
//! │                 │ pathway-core  │                   │
//! │                 │  (THE MODEL)  │                   │
//! │                 └───────────────┘                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Edit a local workflow file
//! pathway init listening.json
//! pathway add-exercise listening.json --kind listening --label "Warm-up"
//! pathway connect listening.json entry-1 exercise-1
//! pathway validate listening.json
//!
//! # Store it and serve the editor API
//! pathway push listening.json listening-a1
//! pathway serve --port 8080
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // PATHWAY_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PATHWAY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pathway=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && cli.is_serve() {
        print_banner();
    }

    match cli::execute(cli).await {
        Ok(true) => {}
        // The command ran but reported a failing workflow (validate, push, hash --expect).
        Ok(false) => std::process::exit(2),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the Pathway startup banner.
fn print_banner() {
    println!(
        r#"
  ___  ____ ___ _  _ _ _ _ ____ _   _
  |__] |__|  |  |__| | | | |__|  \_/
  |    |  |  |  |  | |_|_| |  |   |

  Learning Workflow Designer v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
