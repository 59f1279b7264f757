//! WikiChat application binary - composition root.
//!
//! 1. Parse the CLI and load configuration and secrets
//! 2. Wire the Wikipedia reader, embedding service, and LLM client
//! 3. Build the routed index once (`IndexCache`)
//! 4. Either serve the chat page or answer a single question and exit

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wikichat_api::state::AppState;
use wikichat_chat::{ChatOrchestrator, Submission};
use wikichat_core::{AnswerRouter, Secrets, WikichatConfig};
use wikichat_index::{
    BuildSettings, IndexBuilder, IndexCache, OpenAiChat, OpenAiEmbedding, WikipediaReader,
};

use crate::cli::{CliArgs, Command};

/// How often idle sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

/// Wire the production collaborators and build the index.
async fn build_router(
    config: &WikichatConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn AnswerRouter>, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(config.llm.request_timeout_secs);
    let source = WikipediaReader::new(&config.corpus.language, timeout)?;
    let embedder = OpenAiEmbedding::new(&config.llm, secrets)?;
    let llm = OpenAiChat::new(&config.llm, secrets)?;

    let builder = IndexBuilder::new(
        Arc::new(source),
        Arc::new(embedder),
        Arc::new(llm),
        BuildSettings::from_config(config),
    );
    let cache = IndexCache::new(builder);
    let index: Arc<dyn AnswerRouter> = cache.ensure_index().await?;
    Ok(index)
}

async fn serve(
    args: &CliArgs,
    config: WikichatConfig,
    router: Arc<dyn AnswerRouter>,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = Arc::new(ChatOrchestrator::from_config(router, &config));

    let sweeper = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.sweep_expired();
        }
    });

    let mut server = config.server.clone();
    server.port = args.resolve_port(server.port);

    let state = AppState::new(config, orchestrator);
    if let Err(e) = wikichat_api::start_server(&server, state).await {
        tracing::error!(error = %e, "Server stopped");
        tracing::error!("Is another instance running? Try: wikichat serve --port {}", server.port.saturating_add(1));
        return Err(e.into());
    }
    Ok(())
}

async fn ask(
    config: &WikichatConfig,
    router: Arc<dyn AnswerRouter>,
    question: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = ChatOrchestrator::from_config(router, config);
    let session = orchestrator.ensure_transcript(None).await?;
    let view = orchestrator
        .handle_submission(session.session_id, Submission::FreeText(question))
        .await?;
    print!("{}", view);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        WikichatConfig::load(&config_file)?
    } else {
        WikichatConfig::default()
    };

    init_tracing(&args.resolve_log_level(&config.general.log_level));
    tracing::info!("Starting WikiChat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), exists = config_file.exists(), "Configuration resolved");

    let secrets_file = args.resolve_secrets_path();
    let secrets = match Secrets::load(Some(&secrets_file)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without an OpenAI API key");
            return Err(e.into());
        }
    };

    let router = match build_router(&config, &secrets).await {
        Ok(router) => router,
        Err(e) => {
            tracing::error!(error = %e, page = %config.corpus.page_title, "Index build failed");
            return Err(e);
        }
    };

    match args.command() {
        Command::Serve { .. } => serve(&args, config, router).await,
        Command::Ask { question } => ask(&config, router, question).await,
    }
}
