use tote_sim::SimState;
use tote_store::{Config, FileReportWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tote_sim=info,tote_dispatch=info,tote_order=info,\
                 tote_catalog=info,tote_store=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        deliveries = config.simulation.deliveries,
        transit_ms = config.simulation.transit_millis,
        "Starting delivery simulation"
    );

    let writer = FileReportWriter::new(config.report.format);
    let state = SimState::new(config);
    let summary = state.run(&writer).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
