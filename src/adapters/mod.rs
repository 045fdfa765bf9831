//! Per-gallery parsers turning list and detail pages into listing entries.
//!
//! Adapters are pure: the same HTML and page URL always give the same entries.

pub mod factory;
pub mod html;

pub mod gallery_eun;
pub mod gallery_meme;
pub mod insa1010;
pub mod insa_art;
pub mod ro_gallery;
pub mod seoul_noin;

use crate::error::Result;
use crate::types::ListingEntry;
use reqwest::Url;

pub use factory::create_adapter;

/// Site-specific parsing for one gallery
pub trait GalleryAdapter: Send + Sync {
    fn gallery_id(&self) -> &'static str;

    /// Parse the list page into entries, deduplicated by source URL.
    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>>;

    /// Merge what the detail page adds into `entry`.
    fn parse_detail(&self, _html: &str, _page_url: &Url, _entry: &mut ListingEntry) -> Result<()> {
        Ok(())
    }
}
