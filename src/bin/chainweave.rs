//! Chainweave CLI: inspect and repair predecessor chains in a markdown vault
//!
//! Usage:
//!   chainweave chain <vault> <doc> [--json]
//!   chainweave branches <vault> <doc>
//!   chainweave check <vault>
//!   chainweave delete <vault> <doc>

use chainweave::{
    chain_view, classify_successors, ChainGraph, ChainService, DocumentStore, EngineConfig,
    NodeId, Removal, VaultStore,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "chainweave",
    version,
    about = "Predecessor-chain graph engine for linked markdown notes"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the chain through a document
    Chain {
        /// Vault root directory
        vault: PathBuf,
        /// Document id or link text
        doc: String,
        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Show which successor of a document continues its chain
    Branches {
        /// Vault root directory
        vault: PathBuf,
        /// Document id or link text
        doc: String,
    },
    /// Report graph statistics and dangling references
    Check {
        /// Vault root directory
        vault: PathBuf,
    },
    /// Delete a document, pointing its successors at its predecessor
    Delete {
        /// Vault root directory
        vault: PathBuf,
        /// Document id or link text
        doc: String,
    },
}

async fn open_service(
    vault: &Path,
    config: &EngineConfig,
) -> Result<(Arc<VaultStore>, ChainService), String> {
    let store = VaultStore::with_config(vault, config.clone())
        .map(Arc::new)
        .map_err(|e| format!("Failed to open vault: {}", e))?;
    let shared: Arc<dyn DocumentStore> = store.clone();
    let service = ChainService::open(shared, config)
        .await
        .map_err(|e| format!("Failed to build chain graph: {}", e))?;
    Ok((store, service))
}

/// Accept either an exact id or anything a note could link with
fn find_document(graph: &ChainGraph, arg: &str) -> Option<NodeId> {
    let exact = NodeId::from(arg);
    if graph.contains(&exact) {
        return Some(exact);
    }
    graph.resolve_reference(arg)
}

fn label(graph: &ChainGraph, id: &NodeId) -> String {
    match graph.node(id) {
        Some(node) if !node.is_resolved() => format!("{} (missing)", id),
        _ => id.to_string(),
    }
}

fn cmd_chain(service: &ChainService, doc: &str, json: bool) -> i32 {
    let graph = service.graph();
    let Some(id) = find_document(graph, doc) else {
        eprintln!("Error: document '{}' not found", doc);
        return 1;
    };
    let view = chain_view(graph, &id);

    if json {
        return match serde_json::to_string_pretty(&view) {
            Ok(text) => {
                println!("{}", text);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    for (position, node) in view.canonical.iter().enumerate() {
        let marker = if *node == view.focus { ">" } else { " " };
        println!("{} {:>3}  {}", marker, position + 1, label(graph, node));
    }
    if !view.replies.is_empty() {
        println!();
        println!("Replies to {}:", view.focus);
        for reply in &view.replies {
            println!("    {}", reply);
        }
    }
    if !view.sibling_replies.is_empty() {
        println!();
        println!("Other replies to the same predecessor:");
        for reply in &view.sibling_replies {
            println!("    {}", reply);
        }
    }
    0
}

fn cmd_branches(service: &ChainService, doc: &str) -> i32 {
    let graph = service.graph();
    let Some(id) = find_document(graph, doc) else {
        eprintln!("Error: document '{}' not found", doc);
        return 1;
    };

    let split = classify_successors(graph, &id);
    let Some(main) = split.main else {
        println!("{} has no successors.", id);
        return 0;
    };

    let created = |id: &NodeId| {
        graph
            .node(id)
            .and_then(|n| n.attrs.created_time)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    };
    println!("{:<10}  {:<25}  {}", "ROLE", "CREATED", "DOCUMENT");
    println!("{}", "-".repeat(72));
    println!("{:<10}  {:<25}  {}", "canonical", created(&main), main);
    for reply in &split.replies {
        println!("{:<10}  {:<25}  {}", "reply", created(reply), reply);
    }
    0
}

fn cmd_check(service: &ChainService) -> i32 {
    let graph = service.graph();
    let stats = graph.stats();
    println!("Documents:     {}", stats.node_count - stats.placeholder_count);
    println!("Links:         {}", stats.edge_count);
    println!("Branch points: {}", stats.branch_points);
    println!("Dangling:      {}", stats.placeholder_count);

    for placeholder in graph.placeholders() {
        println!();
        println!("Missing '{}' referenced by:", placeholder);
        for referrer in service.successors_of(&placeholder) {
            println!("    {}", referrer);
        }
    }
    if stats.placeholder_count > 0 {
        1
    } else {
        0
    }
}

async fn cmd_delete(store: &VaultStore, service: &mut ChainService, doc: &str) -> i32 {
    let Some(id) = find_document(service.graph(), doc) else {
        eprintln!("Error: document '{}' not found", doc);
        return 1;
    };
    if let Err(e) = store.remove_document(&id).await {
        eprintln!("Error: failed to delete '{}': {}", id, e);
        return 1;
    }

    let outcome = service.handle_delete(&id).await;
    println!("Deleted '{}'", id);
    for successor in &outcome.heal.rewired {
        match &outcome.heal.grandparent {
            Some(grandparent) => println!("  {} now follows {}", successor, grandparent),
            None => println!("  {} now starts a chain", successor),
        }
    }
    for (successor, e) in &outcome.heal.failed {
        eprintln!("  Warning: could not update {}: {}", successor, e);
    }
    if outcome.removal == Removal::Demoted {
        eprintln!("  Warning: '{}' is still referenced and remains dangling", id);
    }
    if outcome.heal.is_complete() {
        0
    } else {
        1
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("CHAINWEAVE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();

    let config = match EngineConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let vault = match &cli.command {
        Commands::Chain { vault, .. }
        | Commands::Branches { vault, .. }
        | Commands::Check { vault }
        | Commands::Delete { vault, .. } => vault.clone(),
    };
    let (store, mut service) = match open_service(&vault, &config).await {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Chain { doc, json, .. } => cmd_chain(&service, &doc, json),
        Commands::Branches { doc, .. } => cmd_branches(&service, &doc),
        Commands::Check { .. } => cmd_check(&service),
        Commands::Delete { doc, .. } => cmd_delete(&store, &mut service, &doc).await,
    };
    std::process::exit(code);
}
