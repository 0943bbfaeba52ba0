//! Named routes of the ads module.

/// Mount point of the module, see `AdsModule::name`.
pub const BASE: &str = "/ads";

/// Every page the module serves. Links and redirects are built from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdRoute<'a> {
    Index { page: u64 },
    Show { slug: &'a str },
    Create,
    Edit { slug: &'a str },
    Delete { slug: &'a str },
}

impl AdRoute<'_> {
    pub fn path(&self) -> String {
        match self {
            Self::Index { page } if *page <= 1 => BASE.to_string(),
            Self::Index { page } => format!("{BASE}/{page}"),
            Self::Show { slug } => format!("{BASE}/{slug}"),
            Self::Create => format!("{BASE}/new"),
            Self::Edit { slug } => format!("{BASE}/{slug}/edit"),
            Self::Delete { slug } => format!("{BASE}/{slug}/delete"),
        }
    }
}

/// A path segment under the base is either a page number or a slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Page(u64),
    Slug(&'a str),
}

impl<'a> Segment<'a> {
    /// Digit-only segments are pages; slugs are never purely numeric.
    /// Pages too large for `u64` saturate.
    pub fn parse(segment: &'a str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            Self::Page(segment.parse().unwrap_or(u64::MAX))
        } else {
            Self::Slug(segment)
        }
    }
}
