//! The ad form, shared by create and edit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::models::{Ad, AdInput, ImageInput};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 255;
/// Image rows the form always offers, filled or not.
const MIN_IMAGE_ROWS: usize = 3;

/// Raw submission. Images arrive as repeated `image_url`/`image_caption` keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub image_url: Vec<String>,
    #[serde(default)]
    pub image_caption: Vec<String>,
}

/// Messages per field name, in field order of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What the form template renders: submitted values plus padded image rows.
#[derive(Debug, Serialize)]
pub struct FormView {
    pub title: String,
    pub description: String,
    pub price: String,
    pub cover_image: String,
    pub images: Vec<ImageRow>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImageRow {
    pub url: String,
    pub caption: String,
}

impl AdForm {
    /// Check every rule and produce the input for [`Ad::create`]/[`Ad::apply`].
    ///
    /// Rows with neither URL nor caption are dropped.
    pub fn validate(&self) -> Result<AdInput, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        let title_len = title.chars().count();
        if title_len < TITLE_MIN || title_len > TITLE_MAX {
            errors.add(
                "title",
                format!("The title must be between {TITLE_MIN} and {TITLE_MAX} characters"),
            );
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", "The description is required");
        }

        let price = match parse_price(&self.price) {
            Ok(price) => price,
            Err(message) => {
                errors.add("price", message);
                0.0
            }
        };

        let cover_image = self.cover_image.trim();
        if !cover_image.is_empty() && !is_web_url(cover_image) {
            errors.add("cover_image", "The cover image must be an http(s) URL");
        }

        let mut images = Vec::new();
        for (n, row) in self.image_rows().into_iter().enumerate() {
            let url = row.url.trim();
            let caption = row.caption.trim();
            if url.is_empty() && caption.is_empty() {
                continue;
            }
            if !is_web_url(url) {
                errors.add("images", format!("Image {} needs an http(s) URL", n + 1));
                continue;
            }
            images.push(ImageInput {
                url: url.to_string(),
                caption: caption.to_string(),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AdInput {
            title: title.to_string(),
            description: description.to_string(),
            price,
            cover_image: (!cover_image.is_empty()).then(|| cover_image.to_string()),
            images,
        })
    }

    /// Pair up URLs and captions; a missing partner is blank.
    fn image_rows(&self) -> Vec<ImageRow> {
        let count = self.image_url.len().max(self.image_caption.len());
        (0..count)
            .map(|i| ImageRow {
                url: self.image_url.get(i).cloned().unwrap_or_default(),
                caption: self.image_caption.get(i).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn view(&self) -> FormView {
        let mut images = self.image_rows();
        let rows = (images.len() + 1).max(MIN_IMAGE_ROWS);
        images.resize_with(rows, ImageRow::default);

        FormView {
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            cover_image: self.cover_image.clone(),
            images,
        }
    }
}

impl From<&Ad> for AdForm {
    fn from(ad: &Ad) -> Self {
        Self {
            title: ad.title.clone(),
            description: ad.description.clone(),
            price: ad.price.to_string(),
            cover_image: ad.cover_image.clone().unwrap_or_default(),
            image_url: ad.images.iter().map(|image| image.url.clone()).collect(),
            image_caption: ad.images.iter().map(|image| image.caption.clone()).collect(),
        }
    }
}

/// Non-negative finite number; a decimal comma is accepted.
fn parse_price(raw: &str) -> Result<f64, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("The price is required");
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        Ok(_) => Err("The price must be a positive number"),
        Err(_) => Err("The price must be a number"),
    }
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> AdForm {
        AdForm {
            title: "Vélo".to_string(),
            description: "Un vélo de ville".to_string(),
            price: "50".to_string(),
            cover_image: String::new(),
            image_url: vec!["https://img.example/1.jpg".to_string()],
            image_caption: vec!["front".to_string()],
        }
    }

    #[test]
    fn valid_form_produces_input() {
        let input = form().validate().unwrap();
        assert_eq!(input.title, "Vélo");
        assert_eq!(input.price, 50.0);
        assert_eq!(input.cover_image, None);
        assert_eq!(
            input.images,
            vec![ImageInput {
                url: "https://img.example/1.jpg".to_string(),
                caption: "front".to_string(),
            }]
        );
    }

    #[test]
    fn title_length_counts_characters() {
        let mut short = form();
        short.title = "Vé".to_string();
        assert_eq!(short.validate().unwrap_err().get("title").len(), 1);

        let mut long = form();
        long.title = "é".repeat(256);
        assert!(long.validate().is_err());

        let mut edge = form();
        edge.title = "é".repeat(255);
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn price_rules() {
        let mut f = form();
        f.price = "12,50".to_string();
        assert_eq!(f.validate().unwrap().price, 12.5);

        for bad in ["", "-1", "abc", "inf", "NaN"] {
            f.price = bad.to_string();
            let errors = f.validate().unwrap_err();
            assert_eq!(errors.get("price").len(), 1, "price {bad:?} should be refused");
        }
    }

    #[test]
    fn every_broken_field_is_reported() {
        let f = AdForm {
            cover_image: "ftp://files.example/cover.jpg".to_string(),
            image_url: vec!["not a url".to_string()],
            ..AdForm::default()
        };

        let errors = f.validate().unwrap_err();
        for field in ["title", "description", "price", "cover_image", "images"] {
            assert!(!errors.get(field).is_empty(), "missing error for {field}");
        }
    }

    #[test]
    fn blank_image_rows_are_skipped() {
        let mut f = form();
        f.image_url = vec![String::new(), "https://img.example/2.jpg".to_string(), " ".to_string()];
        f.image_caption = vec![String::new(), String::new()];

        let input = f.validate().unwrap();
        assert_eq!(input.images.len(), 1);
        assert_eq!(input.images[0].url, "https://img.example/2.jpg");
    }

    #[test]
    fn caption_without_url_is_an_error() {
        let mut f = form();
        f.image_url = vec![];
        f.image_caption = vec!["lonely".to_string()];

        assert_eq!(f.validate().unwrap_err().get("images"), ["Image 1 needs an http(s) URL"]);
    }

    #[test]
    fn view_pads_image_rows() {
        let view = form().view();
        assert_eq!(view.images.len(), MIN_IMAGE_ROWS);
        assert_eq!(view.images[0].caption, "front");
        assert!(view.images[1].url.is_empty());
    }
}
