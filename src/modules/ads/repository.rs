//! Persistence of ads together with their images.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entity::{ad, image};
use super::models::{Ad, Image};
use super::pagination::PageWindow;

/// Storage collaborator of the ads workflow.
///
/// `save` and `remove` are atomic over the ad and its whole image set.
#[async_trait]
pub trait AdRepository: Send + Sync {
    async fn count(&self) -> anyhow::Result<u64>;

    /// Ads in creation order, restricted to `window`.
    async fn find_window(&self, window: PageWindow) -> anyhow::Result<Vec<Ad>>;

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Ad>>;

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool>;

    /// Insert or update `ad`, replacing its stored images with `ad.images`.
    async fn save(&self, ad: &Ad) -> anyhow::Result<()>;

    async fn remove(&self, ad: &Ad) -> anyhow::Result<()>;
}

fn ensure_attached(ad: &Ad) -> anyhow::Result<()> {
    if let Some(image) = ad.images.iter().find(|image| image.ad_id != ad.id) {
        anyhow::bail!("image {} is not attached to ad {}", image.id, ad.slug);
    }
    Ok(())
}

pub struct SeaOrmAdRepository {
    db: DatabaseConnection,
}

impl SeaOrmAdRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: ad::Model, images: Vec<image::Model>) -> Ad {
    Ad {
        id: model.id,
        slug: model.slug,
        title: model.title,
        description: model.description,
        price: model.price,
        cover_image: model.cover_image,
        author_id: model.author_id,
        author_name: model.author_name,
        created_at: model.created_at,
        images: images
            .into_iter()
            .map(|image| Image {
                id: image.id,
                ad_id: image.ad_id,
                url: image.url,
                caption: image.caption,
            })
            .collect(),
    }
}

#[async_trait]
impl AdRepository for SeaOrmAdRepository {
    async fn count(&self) -> anyhow::Result<u64> {
        Ok(ad::Entity::find().count(&self.db).await?)
    }

    async fn find_window(&self, window: PageWindow) -> anyhow::Result<Vec<Ad>> {
        let mut query = ad::Entity::find()
            .order_by_asc(ad::Column::CreatedAt)
            .order_by_asc(ad::Column::Id);
        if let Some(limit) = window.limit {
            query = query.offset(window.offset).limit(limit);
        }
        let ads = query.all(&self.db).await?;
        if ads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = ads.iter().map(|ad| ad.id).collect();
        let mut images_by_ad: HashMap<Uuid, Vec<image::Model>> = HashMap::new();
        for image in image::Entity::find()
            .filter(image::Column::AdId.is_in(ids))
            .order_by_asc(image::Column::Position)
            .all(&self.db)
            .await?
        {
            images_by_ad.entry(image.ad_id).or_default().push(image);
        }

        Ok(ads
            .into_iter()
            .map(|ad| {
                let images = images_by_ad.remove(&ad.id).unwrap_or_default();
                to_domain(ad, images)
            })
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Ad>> {
        let Some(model) = ad::Entity::find()
            .filter(ad::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let images = model
            .find_related(image::Entity)
            .order_by_asc(image::Column::Position)
            .all(&self.db)
            .await?;
        Ok(Some(to_domain(model, images)))
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        let matches = ad::Entity::find()
            .filter(ad::Column::Slug.eq(slug))
            .count(&self.db)
            .await?;
        Ok(matches > 0)
    }

    async fn save(&self, ad: &Ad) -> anyhow::Result<()> {
        ensure_attached(ad)?;

        let txn = self.db.begin().await?;

        let row = ad::ActiveModel {
            id: Set(ad.id),
            slug: Set(ad.slug.clone()),
            title: Set(ad.title.clone()),
            description: Set(ad.description.clone()),
            price: Set(ad.price),
            cover_image: Set(ad.cover_image.clone()),
            author_id: Set(ad.author_id),
            author_name: Set(ad.author_name.clone()),
            created_at: Set(ad.created_at),
        };
        if ad::Entity::find_by_id(ad.id).one(&txn).await?.is_some() {
            row.update(&txn).await?;
        } else {
            row.insert(&txn).await?;
        }

        image::Entity::delete_many()
            .filter(image::Column::AdId.eq(ad.id))
            .exec(&txn)
            .await?;

        let images: Vec<image::ActiveModel> = ad
            .images
            .iter()
            .zip(0i32..)
            .map(|(image, position)| image::ActiveModel {
                id: Set(image.id),
                ad_id: Set(image.ad_id),
                url: Set(image.url.clone()),
                caption: Set(image.caption.clone()),
                position: Set(position),
            })
            .collect();
        if !images.is_empty() {
            image::Entity::insert_many(images)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn remove(&self, ad: &Ad) -> anyhow::Result<()> {
        let txn = self.db.begin().await?;

        image::Entity::delete_many()
            .filter(image::Column::AdId.eq(ad.id))
            .exec(&txn)
            .await?;
        let result = ad::Entity::delete_by_id(ad.id).exec(&txn).await?;

        txn.commit().await?;

        if result.rows_affected == 0 {
            tracing::debug!(slug = %ad.slug, "ad was already removed");
        }
        Ok(())
    }
}
