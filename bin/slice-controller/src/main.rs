use anyhow::{Context, Result};
use kube::Client;
use slice_core::RouterConfig;
use tracing::info;
use tracing_subscriber::fmt::init as tracing_init;

mod slice_controller;

use slice_controller::SliceController;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    info!("Starting slice-controller...");

    let config = RouterConfig::from_env().context("error building router config from env")?;
    info!(
        router_image = %config.router_image,
        sidecar_image = %config.sidecar_image,
        control_plane_namespace = %config.control_plane_namespace,
        "Loaded router configuration"
    );

    let client = Client::try_default().await?;
    SliceController::new(client, config).run().await?;

    info!("Shutdown signal received, exiting...");
    Ok(())
}
