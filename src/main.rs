use mimalloc::MiMalloc;
use modules::{
    common::rustls::MailOrderTls,
    context::Initialize,
    error::OrderResult,
    logger,
    metrics::MetricsService,
    order::pipeline::{place_order, OrderOutcome},
    rest::start_http_server,
    settings::{cli::SETTINGS, config::OrderConfig},
};
use tracing::{error, info};

mod modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> OrderResult<()> {
    logger::initialize_logging();
    info!("Starting mailorder");
    info!("Version:  {}", mailorder_version!());
    info!("Git:      [{}]", env!("GIT_HASH"));

    let config = match initialize().await {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{:?}", error);
            return Err(error);
        }
    };

    if SETTINGS.mailorder_serve {
        return start_http_server(config).await;
    }

    match place_order(&config).await {
        Ok(OrderOutcome::Sent { message_id, .. }) => {
            info!("Order {} placed", message_id);
            Ok(())
        }
        Ok(OrderOutcome::Skipped) => {
            info!("Cooldown still running, no order placed");
            Ok(())
        }
        Err(e) => {
            error!("Order run failed: {}", e);
            Err(e)
        }
    }
}

/// Validates settings and installs process-wide services.
async fn initialize() -> OrderResult<OrderConfig> {
    let config = OrderConfig::from_settings(&SETTINGS)?;
    info!("Configuration: {:?}", config);
    MetricsService::initialize().await?;
    MailOrderTls::initialize().await?;
    Ok(config)
}
