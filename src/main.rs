use anyhow::Result;
use axum::Router;
use outage_risk_forecaster::{api, app::AppState, config::Config, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    telemetry::init_tracing(&cfg.telemetry);

    let addr = cfg.server.socket_addr()?;
    let app_state = AppState::new(cfg.clone());

    #[allow(unused_mut)]
    let mut app: Router = api::router(app_state.clone());

    #[cfg(feature = "swagger")]
    {
        app = api::with_swagger(app);
    }

    #[cfg(feature = "metrics")]
    {
        app = api::with_metrics(app);
    }

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 - service will be accessible from network! \
            For production, bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    info!(%addr, mode = %app_state.engine.mode(), "starting Outage Risk Forecaster");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
