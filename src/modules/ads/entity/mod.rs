//! sea-orm mappings of the `ad` and `image` tables.

pub mod ad;
pub mod image;
