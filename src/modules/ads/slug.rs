//! Slug derivation for ad URLs.

use super::repository::AdRepository;

const FALLBACK: &str = "ad";
/// Static path segments under the mount point.
const RESERVED: &[&str] = &["new"];

/// Derive the base slug for a title: ASCII, lowercase, `-` separated.
///
/// Purely numeric slugs get an `ad-` prefix since `/ads/{digits}` is a
/// listing page, and so do slugs shadowed by a static route.
pub fn slugify(title: &str) -> String {
    let slug = ::slug::slugify(title);
    if slug.is_empty() {
        FALLBACK.to_string()
    } else if slug.bytes().all(|b| b.is_ascii_digit() || b == b'-')
        || RESERVED.contains(&slug.as_str())
    {
        format!("{FALLBACK}-{slug}")
    } else {
        slug
    }
}

/// First free slug among `base`, `base-2`, `base-3`, ...
pub async fn unique_slug(repo: &dyn AdRepository, title: &str) -> anyhow::Result<String> {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut suffix = 1u32;

    while repo.slug_exists(&candidate).await? {
        suffix += 1;
        candidate = format!("{base}-{suffix}");
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ads::models::{Ad, AdInput};
    use crate::modules::ads::repository::memory::MemoryAdRepository;

    #[test]
    fn transliterates_accents() {
        assert_eq!(slugify("Vélo"), "velo");
        assert_eq!(slugify("  Belle Maison à Lyon!  "), "belle-maison-a-lyon");
    }

    #[test]
    fn never_looks_like_a_page_number() {
        assert_eq!(slugify("2024"), "ad-2024");
        assert_eq!(slugify("!!!"), "ad");
        assert_eq!(slugify("New"), "ad-new");
    }

    #[tokio::test]
    async fn appends_counter_when_taken() -> anyhow::Result<()> {
        let repo = MemoryAdRepository::new();
        assert_eq!(unique_slug(&repo, "Vélo").await?, "velo");

        for slug in ["velo", "velo-2"] {
            let input = AdInput {
                title: "Vélo".to_string(),
                description: "Un vélo".to_string(),
                price: 10.0,
                cover_image: None,
                images: vec![],
            };
            repo.save(&Ad::create(input, slug.to_string(), None)).await?;
        }

        assert_eq!(unique_slug(&repo, "Vélo").await?, "velo-3");
        Ok(())
    }
}
