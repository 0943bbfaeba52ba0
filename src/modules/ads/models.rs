use chrono::{DateTime, Utc};
use classifieds_authz::Principal;
use serde::Serialize;
use uuid::Uuid;

/// A classified listing with its images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ad {
    pub id: Uuid,
    /// URL-safe unique identifier, fixed at creation
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover_image: Option<String>,
    /// `None` only for ads created while anonymous creation was allowed
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub images: Vec<Image>,
}

/// An image owned by exactly one ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub url: String,
    pub caption: String,
}

/// Validated form data shared by create and edit.
#[derive(Debug, Clone, PartialEq)]
pub struct AdInput {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover_image: Option<String>,
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub url: String,
    pub caption: String,
}

impl Image {
    /// A detached image; [`Ad::attach_images`] sets its owner.
    pub fn new(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ad_id: Uuid::nil(),
            url: url.into(),
            caption: caption.into(),
        }
    }
}

impl Ad {
    /// Build a new ad authored by `author` (if any), images attached.
    pub fn create(input: AdInput, slug: String, author: Option<&Principal>) -> Self {
        let mut ad = Self {
            id: Uuid::new_v4(),
            slug,
            title: String::new(),
            description: String::new(),
            price: 0.0,
            cover_image: None,
            author_id: author.map(|p| p.user_id),
            author_name: author.map(|p| p.name.clone()),
            created_at: Utc::now(),
            images: Vec::new(),
        };
        ad.apply(input);
        ad
    }

    /// Replace the editable fields and the image set. Slug and author are kept.
    pub fn apply(&mut self, input: AdInput) {
        self.title = input.title;
        self.description = input.description;
        self.price = input.price;
        self.cover_image = input.cover_image;
        self.images = input
            .images
            .into_iter()
            .map(|image| Image::new(image.url, image.caption))
            .collect();
        self.attach_images();
    }

    /// Point every image's back-reference at this ad.
    pub fn attach_images(&mut self) {
        for image in &mut self.images {
            image.ad_id = self.id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifieds_authz::Role;

    fn input() -> AdInput {
        AdInput {
            title: "Vélo".to_string(),
            description: "Un vélo de ville".to_string(),
            price: 50.0,
            cover_image: None,
            images: vec![
                ImageInput {
                    url: "https://img.example/1.jpg".to_string(),
                    caption: "front".to_string(),
                },
                ImageInput {
                    url: "https://img.example/2.jpg".to_string(),
                    caption: String::new(),
                },
            ],
        }
    }

    #[test]
    fn create_sets_author_and_attaches_images() {
        let author = Principal::new(Uuid::new_v4(), "Ana", vec![Role::User]);
        let ad = Ad::create(input(), "velo".to_string(), Some(&author));

        assert_eq!(ad.author_id, Some(author.user_id));
        assert_eq!(ad.author_name.as_deref(), Some("Ana"));
        assert_eq!(ad.images.len(), 2);
        assert!(ad.images.iter().all(|image| image.ad_id == ad.id));
    }

    #[test]
    fn apply_keeps_identity_and_replaces_images() {
        let mut ad = Ad::create(input(), "velo".to_string(), None);
        let (id, slug, created_at) = (ad.id, ad.slug.clone(), ad.created_at);

        let mut edited = input();
        edited.title = "Vélo rouge".to_string();
        edited.images.truncate(1);
        ad.apply(edited);

        assert_eq!((ad.id, ad.slug.as_str(), ad.created_at), (id, slug.as_str(), created_at));
        assert_eq!(ad.title, "Vélo rouge");
        assert_eq!(ad.images.len(), 1);
        assert_eq!(ad.images[0].ad_id, id);
        assert_eq!(ad.author_id, None);
    }
}
