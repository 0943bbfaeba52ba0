use anyhow::Context;
use classifieds_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load classifieds settings")?;
    classifieds_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "classifieds-app starting"
    );

    classifieds_app::serve(&settings).await
}
