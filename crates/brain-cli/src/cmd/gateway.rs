use anyhow::Context;
use brain_gateway::{AppState, GatewayConfig};

pub fn run(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    if let Some(port) = port {
        config.port = port;
    }
    let state = AppState::new(config).context("failed to initialise gateway clients")?;
    let port = state.config.port;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        tokio::select! {
            res = brain_gateway::serve_on(listener, state) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
