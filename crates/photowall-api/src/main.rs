use photowall_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    photowall_infra::init_telemetry(config.log_json, "photowall=debug,tower_http=debug")
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (state, app) = photowall_api::setup::initialize_app(config.clone()).await?;

    let served = photowall_api::setup::server::start_server(&config, app).await;

    state.shutdown().await;
    photowall_infra::shutdown_telemetry().await;

    served
}
