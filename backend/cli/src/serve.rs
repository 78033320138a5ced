//! `signbridge serve`: wire the transport, wallet sidecar and orchestrator, then
//! run until Ctrl-C.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use signbridge_bridge::{
    Orchestrator, OrchestratorConfig, PairingConsumer, SidecarWallet, StatusPublisher,
    WalletEventPump,
};
use signbridge_config::{BridgeConfig, redact_url};
use signbridge_core::{Component, StatusEvent};
use signbridge_queue::{CorrelatedRpc, QueueTransport, RedisTransport};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

const INBOUND_CAPACITY: usize = 256;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = signbridge_config::load(config_path).await?;
    let _guard = signbridge_logging::init_logger(
        config.logging.dir.as_deref(),
        &config.logging.level,
        config.logging.json,
    );
    install_panic_hook();
    let config = signbridge_config::prepare(config)?;

    run_bridge(config).await
}

async fn run_bridge(config: BridgeConfig) -> Result<()> {
    let redis_url = config.redis_url()?;
    info!(
        redis = %redact_url(redis_url),
        network = %config.network,
        pairing_queue = %config.queues.pairing_requests,
        signing_queue = %config.queues.signing_requests,
        "Starting signbridge"
    );

    let transport: Arc<dyn QueueTransport> = Arc::new(
        RedisTransport::connect(redis_url)
            .await
            .with_context(|| format!("failed to connect to {}", redact_url(redis_url)))?,
    );

    let wallet = Arc::new(SidecarWallet::new(
        CorrelatedRpc::new(
            transport.clone(),
            &config.queues.wallet_commands,
            &config.queues.wallet_reply_prefix,
        )
        .with_poll_tick(config.timeouts.poll_tick()),
        config.timeouts.wallet_command(),
    ));
    let signer = CorrelatedRpc::new(
        transport.clone(),
        &config.queues.signing_requests,
        &config.queues.reply_prefix,
    )
    .with_poll_tick(config.timeouts.poll_tick());
    let status = StatusPublisher::new(transport.clone(), &config.queues.status_events);

    let orchestrator = Arc::new(Orchestrator::new(
        OrchestratorConfig {
            network: config.network.clone(),
            request_timeout: config.timeouts.request(),
            default_methods: config.default_methods.clone(),
            default_events: config.default_events.clone(),
        },
        wallet,
        status,
        signer,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);

    let orchestrator_task = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.start(inbound_rx).await {
                error!(error = %e, "Orchestrator task failed");
            }
        })
    };

    let pump = WalletEventPump::new(
        transport.clone(),
        &config.queues.wallet_events,
        config.timeouts.consumer_backoff(),
        inbound_tx,
    );
    let pump_task = tokio::spawn(pump.run(shutdown_rx.clone()));

    let consumer = PairingConsumer::new(
        transport,
        &config.queues.pairing_requests,
        config.timeouts.consumer_backoff(),
        orchestrator.clone(),
    );
    let consumer_task = tokio::spawn(consumer.run(shutdown_rx));

    orchestrator
        .emit(StatusEvent::ready(Some(config.project_id.clone())))
        .await;
    info!("All components started");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    let _ = shutdown_tx.send(true);
    for (name, task) in [("pairing consumer", consumer_task), ("wallet event pump", pump_task)] {
        if let Err(e) = task.await {
            error!(task = name, error = %e, "task did not stop cleanly");
        }
    }
    // The pump held the last sender, so the orchestrator drains and exits.
    if let Err(e) = orchestrator_task.await {
        error!(error = %e, "orchestrator did not stop cleanly");
    }

    info!("signbridge stopped");
    Ok(())
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        error!(%location, panic = %info, "panic");
    }));
}
