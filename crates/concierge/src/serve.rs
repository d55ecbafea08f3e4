// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge serve`: wires the transport, model backend, admin store and
//! booking engine into an [`AgentLoop`] and runs it until a signal arrives.

use std::sync::Arc;
use std::time::Duration;

use concierge_access::{AccessControl, ConnectionTrustResolver};
use concierge_agent::AgentLoop;
use concierge_agent::prompt::{load_system_prompt, system_turns};
use concierge_agent::shutdown::install_signal_handler;
use concierge_booking::BookingEngine;
use concierge_config::ConciergeConfig;
use concierge_core::{
    AdminDirectory, ChannelTransport, CompletionProvider, ConciergeError, HealthStatus,
    PluginAdapter, UserId,
};
use concierge_openai::OpenAiProvider;
use concierge_storage::SqliteAdminStore;
use concierge_telegram::TelegramTransport;
use tracing::{info, warn};

pub async fn run_serve(config: ConciergeConfig) -> Result<(), ConciergeError> {
    init_tracing(&config.agent.log_level);
    info!(agent_name = config.agent.name.as_str(), "starting concierge");

    let mut transport = TelegramTransport::new(&config.telegram)?;

    let provider: Option<Arc<dyn CompletionProvider>> = match OpenAiProvider::new(&config.provider)
    {
        Ok(provider) => Some(Arc::new(provider)),
        Err(ConciergeError::Config(message)) => {
            warn!(%message, "model backend disabled, business messages get no AI reply");
            None
        }
        Err(e) => return Err(e),
    };

    let admins = Arc::new(SqliteAdminStore::open(&config.storage.database_path).await?);
    info!(
        path = config.storage.database_path.as_str(),
        "admin store opened"
    );

    let request_timeout = Duration::from_secs(config.telegram.request_timeout_secs);
    let owners: Vec<UserId> = config.telegram.owner_ids.iter().copied().map(UserId).collect();
    let trust = ConnectionTrustResolver::new(
        owners,
        config.telegram.strict_business_connection,
        request_timeout,
    );
    let access = AccessControl::new(trust, admins.clone() as Arc<dyn AdminDirectory>);

    let engine = BookingEngine::from_config(&config.booking, request_timeout)?;
    let persona = load_system_prompt(&config.agent).await;
    let system = system_turns(persona, engine.codec.labels(), &config.booking.final_phrase);

    match transport.health_check().await? {
        HealthStatus::Healthy => info!("Telegram bot reachable"),
        HealthStatus::Unhealthy(reason) => {
            warn!(%reason, "Telegram health check failed, polling anyway");
        }
    }
    transport.connect().await?;

    let mut agent = AgentLoop::new(
        Box::new(transport),
        provider,
        access,
        engine,
        system,
        &config,
    );

    let cancel = install_signal_handler();
    let result = agent.run(cancel).await;

    if let Err(e) = admins.shutdown().await {
        warn!(error = %e, "admin store shutdown failed");
    }
    info!("concierge stopped");
    result
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("concierge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
