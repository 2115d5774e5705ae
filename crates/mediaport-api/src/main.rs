use mediaport_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = mediaport_api::setup::initialize_app(config.clone()).await?;

    mediaport_api::setup::server::start_server(&config, router).await?;

    if let Some(broker) = &state.broker {
        broker.disconnect().await;
    }

    Ok(())
}
