use anyhow::Context;
use photowall_core::{Config, QueueBackend};
use photowall_processing::{DerivationPipeline, DerivationSettings};
use photowall_storage::LocalAssetStore;
use photowall_worker::{connect_queue, DerivationWorker};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    photowall_infra::init_telemetry(config.log_json, "photowall=debug,photowall_worker=debug")
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    if config.queue_backend == QueueBackend::Memory {
        anyhow::bail!(
            "QUEUE_BACKEND=memory is only reachable from inside the API process; \
             the standalone worker requires QUEUE_BACKEND=postgres"
        );
    }

    tracing::info!(
        photos_dir = %config.photos_dir.display(),
        queue = %config.queue_name,
        thumbnail_size = config.thumbnail_size,
        thumbnail_quality = config.thumbnail_quality,
        "Starting derivation worker"
    );

    let store = LocalAssetStore::new(&config.photos_dir, true).await;
    let pipeline = DerivationPipeline::new(store, DerivationSettings::from_config(&config));
    let queue = connect_queue(&config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        photowall_infra::shutdown_signal().await;
        signal_token.cancel();
    });

    DerivationWorker::new(queue.clone(), pipeline, config.worker_poll_timeout)
        .run(shutdown)
        .await;

    queue.close().await;
    photowall_infra::shutdown_telemetry().await;

    Ok(())
}
