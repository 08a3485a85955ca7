use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use mbr_core::{
    command::CommandParser,
    config::Config,
    dispatch::{DispatchConfig, ReactionDispatcher},
    identity::IdentityPool,
    messaging::port::BotApi,
    poller::UpdatePoller,
    state::RuntimeState,
    status::{StatusReporter, StatusSnapshot},
    supervisor::{Supervisor, SupervisorConfig},
};
use mbr_telegram::{TelegramBotApi, TelegramTimeouts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) if e.is_fatal() => {
            eprintln!("startup aborted: {e}");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to load configuration"),
    };
    mbr_core::logging::init("mbr", cfg.log_file.as_deref())?;

    let state = Arc::new(RuntimeState::new());
    info!(
        tokens = cfg.bot_tokens.len(),
        api_base = %cfg.api_base,
        started_at = %state.started_at().format("%Y-%m-%d %H:%M:%S"),
        "starting multi-bot reactor"
    );

    let api: Arc<dyn BotApi> = Arc::new(TelegramBotApi::new(TelegramTimeouts::from(&cfg))?);

    let pool = match IdentityPool::build(api.as_ref(), &cfg.bot_tokens, &cfg.api_base).await {
        Ok(pool) => Arc::new(pool),
        Err(e) if e.is_fatal() => {
            error!(error = %e, "startup aborted");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("identity verification failed"),
    };

    let cancel = CancellationToken::new();

    let reporter = StatusReporter::new(
        state.clone(),
        pool.size(),
        cfg.status_interval,
        cancel.clone(),
    )
    .spawn();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "ctrl-c handler unavailable");
                return;
            }
            info!("interrupt received; shutting down");
            cancel.cancel();
        });
    }

    let supervisor = Supervisor::new(
        pool.clone(),
        UpdatePoller::new(api.clone(), cfg.poll_timeout),
        ReactionDispatcher::new(
            api,
            state.clone(),
            DispatchConfig::from(&cfg),
            cancel.clone(),
        ),
        CommandParser::new(cfg.manual_default_count),
        state.clone(),
        SupervisorConfig::from(&cfg),
        cancel,
    );

    let report = supervisor.run().await;
    let ticks = reporter.await.unwrap_or_default();

    info!(
        cycles = report.cycles,
        restarts = report.restarts,
        status_lines = ticks,
        started_at = %state.started_at().format("%Y-%m-%d %H:%M:%S"),
        final_status = %StatusSnapshot::capture(&state, pool.size()),
        "stopped"
    );

    Ok(())
}
