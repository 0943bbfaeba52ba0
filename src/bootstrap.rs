//! Application assembly: database, modules and HTTP services.

use std::sync::Arc;

use anyhow::Context;
use classifieds_authz::TokenCodec;
use classifieds_http::{auth::Authenticator, session::MemoryFlashStore, HttpServices};
use classifieds_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sea_orm::DatabaseConnection;

use crate::modules;

/// Connected database plus the registered modules.
pub struct App {
    pub db: DatabaseConnection,
    pub registry: ModuleRegistry,
}

impl App {
    pub async fn build(settings: &Settings) -> anyhow::Result<Self> {
        let db = classifieds_db::connect(&settings.database).await?;
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db, settings)?;
        Ok(Self { db, registry })
    }

    pub async fn migrate(&self) -> anyhow::Result<usize> {
        classifieds_db::run_migrations(&self.db, &self.registry.collect_migrations())
            .await
            .context("failed to apply migrations")
    }
}

/// Token codec configured from `auth` settings.
pub fn token_codec(settings: &Settings) -> TokenCodec {
    TokenCodec::new(&settings.auth.jwt_secret, settings.auth.token_ttl_secs)
}

pub fn http_services(settings: &Settings) -> HttpServices {
    HttpServices {
        flash: Arc::new(MemoryFlashStore::new()),
        authenticator: Arc::new(Authenticator::new(
            token_codec(settings),
            settings.auth.token_cookie.clone(),
        )),
    }
}

/// Apply pending migrations and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let app = App::build(settings).await?;
    let applied = app.migrate().await?;
    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

/// Migrate, start every module and serve HTTP until shutdown.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let app = App::build(settings).await?;
    app.migrate().await?;

    let ctx = InitCtx {
        settings,
        db: &app.db,
    };
    app.registry.init_all(&ctx).await?;
    app.registry.start_all(&ctx).await?;

    let served = classifieds_http::start_server(&app.registry, settings, http_services(settings)).await;

    app.registry.stop_all().await?;
    served
}
