pub mod ads;

use classifieds_kernel::{settings::Settings, ModuleRegistry};
use sea_orm::DatabaseConnection;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    db: &DatabaseConnection,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register(ads::create_module(db.clone(), settings.ads.clone())?)?;
    Ok(())
}
