//! Parts-desk binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Load the product catalog and the training conversations
//! 3. Wire the language models, catalog service and message pipeline
//! 4. Answer one question (`--ask`) or run an interactive session

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use partdesk_chat::{ContextStore, Orchestrator};
use partdesk_core::{Catalog, PartdeskConfig, TrainingCorpus};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can seed the
    // filter; the outcome is logged once the subscriber is up.
    let config_file = args.resolve_config_path();
    let (config, config_error) = match PartdeskConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (PartdeskConfig::default(), Some(e)),
    };

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting partdesk v{}", env!("CARGO_PKG_VERSION"));
    match config_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Configuration unavailable, using defaults"
        ),
    }

    // Data.
    let catalog_path = args.resolve_catalog_path(&config.general.catalog_path);
    let catalog = match Catalog::load(&catalog_path) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            tracing::error!(path = %catalog_path.display(), error = %e, "Failed to load catalog");
            return Err(e.into());
        }
    };
    let training_path = args.resolve_training_path(&config.general.training_path);
    let corpus = Arc::new(TrainingCorpus::load_or_empty(&training_path));

    // Pipeline.
    let orchestrator = Orchestrator::from_config(&config, catalog, corpus)?;
    tracing::info!(router = orchestrator.router().strategy_name(), "Pipeline ready");

    let mut store = ContextStore::new();
    let session_id = match args.session.clone() {
        Some(id) => {
            store.session_mut(&id);
            id
        }
        None => store.create_session(),
    };

    if let Some(question) = args.ask.as_deref() {
        let reply = orchestrator
            .handle_message(question, store.session_mut(&session_id))
            .await;
        println!("{}", repl::render(&reply, args.json)?);
        return Ok(());
    }

    repl::run(&orchestrator, &mut store, &session_id, args.json).await
}
