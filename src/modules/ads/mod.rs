//! Classified ads: listing, posting, editing and removal.

pub mod entity;
pub mod form;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod slug;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use classifieds_http::view::Views;
use classifieds_kernel::{settings::AdsSettings, InitCtx, Migration, Module};
use sea_orm::DatabaseConnection;

use handlers::AdsState;
use repository::{AdRepository, SeaOrmAdRepository};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("ads/_form.html", include_str!("templates/ads/_form.html")),
    ("ads/index.html", include_str!("templates/ads/index.html")),
    ("ads/show.html", include_str!("templates/ads/show.html")),
    ("ads/new.html", include_str!("templates/ads/new.html")),
    ("ads/edit.html", include_str!("templates/ads/edit.html")),
];

/// Views of the module, compiled up front.
pub fn views() -> anyhow::Result<Views> {
    let mut views = Views::new();
    for &(name, source) in TEMPLATES {
        views.add(name, source)?;
    }
    Ok(views)
}

pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS ad (
                    id UUID PRIMARY KEY,
                    slug TEXT NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    price DOUBLE PRECISION NOT NULL,
                    cover_image TEXT,
                    author_id UUID,
                    author_name TEXT,
                    created_at TIMESTAMPTZ NOT NULL
                );
                CREATE TABLE IF NOT EXISTS image (
                    id UUID PRIMARY KEY,
                    ad_id UUID NOT NULL REFERENCES ad (id) ON DELETE CASCADE,
                    url TEXT NOT NULL,
                    caption TEXT NOT NULL,
                    position INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS image_ad_id_idx ON image (ad_id);
                "#,
        },
        Migration {
            id: "002_listing_order",
            up: "CREATE INDEX IF NOT EXISTS ad_created_at_idx ON ad (created_at, id);",
        },
    ]
}

/// The ads module, mounted under `/ads`.
pub struct AdsModule {
    state: AdsState,
}

impl AdsModule {
    pub fn new(repo: Arc<dyn AdRepository>, settings: AdsSettings) -> anyhow::Result<Self> {
        Ok(Self {
            state: AdsState {
                repo,
                views: Arc::new(views()?),
                settings,
            },
        })
    }
}

#[async_trait]
impl Module for AdsModule {
    fn name(&self) -> &'static str {
        "ads"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            page_size = self.state.settings.page_size,
            require_login_to_create = self.state.settings.require_login_to_create,
            "ads module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        handlers::router(self.state.clone())
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let ads = self.state.repo.count().await?;
        tracing::info!(module = self.name(), ads, "ads module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "ads module stopped");
        Ok(())
    }
}

/// The module backed by the relational store.
pub fn create_module(
    db: DatabaseConnection,
    settings: AdsSettings,
) -> anyhow::Result<Arc<dyn Module>> {
    let repo = Arc::new(SeaOrmAdRepository::new(db));
    Ok(Arc::new(AdsModule::new(repo, settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::memory::MemoryAdRepository;

    #[test]
    fn every_template_compiles() {
        assert!(views().is_ok());
    }

    #[test]
    fn migrations_are_ordered() {
        let ids: Vec<&str> = migrations().iter().map(|m| m.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn migrations_apply_on_sqlite() -> anyhow::Result<()> {
        let db = classifieds_db::connect_in_memory().await?;
        let migrations: Vec<(String, Migration)> = migrations()
            .into_iter()
            .map(|migration| ("ads".to_string(), migration))
            .collect();

        assert_eq!(classifieds_db::run_migrations(&db, &migrations).await?, 2);
        assert_eq!(classifieds_db::run_migrations(&db, &migrations).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn module_lifecycle() -> anyhow::Result<()> {
        let module = AdsModule::new(
            Arc::new(MemoryAdRepository::new()),
            classifieds_kernel::settings::Settings::default().ads,
        )?;
        let settings = classifieds_kernel::settings::Settings::default();
        let db = DatabaseConnection::Disconnected;
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        assert_eq!(module.name(), "ads");
        module.init(&ctx).await?;
        module.start(&ctx).await?;
        module.stop().await?;
        Ok(())
    }
}
