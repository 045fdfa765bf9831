use super::html::{
    artist_row_value, block_text, dedupe_by_url, first_match, inline_text, resolve, selector,
    split_names,
};
use super::GalleryAdapter;
use crate::constants::RO_GALLERY;
use crate::dates::parse_period;
use crate::error::Result;
use crate::types::ListingEntry;
use reqwest::Url;
use scraper::Html;

/// 노화랑: WordPress current-exhibition posts; detail pages built with WPBakery.
pub struct RoGalleryAdapter;

impl RoGalleryAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RoGalleryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryAdapter for RoGalleryAdapter {
    fn gallery_id(&self) -> &'static str {
        RO_GALLERY
    }

    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let item_sel = selector("article.category-00_current-exhibition")?;
        let thumb_link_sel = selector("a.post-thumbnail-rollover")?;
        let title_link_sel = selector("h3.entry-title a")?;
        let title_sel = selector("h3.entry-title")?;
        let date_sel = selector(".entry-excerpt p")?;

        let mut entries = Vec::new();
        for item in document.select(&item_sel) {
            let href = first_match(item, &thumb_link_sel)
                .or_else(|| first_match(item, &title_link_sel))
                .and_then(|a| a.value().attr("href"));
            let Some(url) = href.and_then(|h| resolve(page_url, h)) else {
                continue;
            };

            let title = first_match(item, &title_sel)
                .map(inline_text)
                .unwrap_or_else(|| inline_text(item));
            if title.is_empty() {
                continue;
            }

            let mut entry = ListingEntry::new(title.clone(), url);
            // Posts are titled after the artist of a solo show
            entry.add_artist(&title);
            if let Some(date) = first_match(item, &date_sel) {
                entry.period_text = inline_text(date);
                (entry.start_date, entry.end_date) = parse_period(&entry.period_text);
            }
            entries.push(entry);
        }

        Ok(dedupe_by_url(entries))
    }

    fn parse_detail(&self, html: &str, page_url: &Url, entry: &mut ListingEntry) -> Result<()> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        if let Some(artists) = artist_row_value(root)? {
            let names = split_names(&artists);
            if !names.is_empty() {
                entry.artists.clear();
                for name in &names {
                    entry.add_artist(name);
                }
            }
        }

        // The longest text block is the exhibition essay
        let wrapper_sel = selector("div.wpb_text_column.wpb_content_element > div.wpb_wrapper")?;
        let p_sel = selector("p")?;
        let chosen = root
            .select(&wrapper_sel)
            .map(|w| (block_text(w).chars().count(), w))
            .filter(|(len, _)| *len > 0)
            .max_by_key(|(len, _)| *len)
            .map(|(_, w)| w);
        if let Some(wrapper) = chosen {
            let paragraphs: Vec<String> = wrapper
                .select(&p_sel)
                .map(block_text)
                .filter(|t| !t.is_empty())
                .collect();
            entry.raw_description = if paragraphs.is_empty() {
                block_text(wrapper)
            } else {
                paragraphs.join("\n")
            };
        }

        let link_sel = selector("div.vc_column-inner a[href*='wp-content/uploads']")?;
        let img_sel = selector("div.vc_column-inner img[src*='wp-content/uploads']")?;
        let links = root.select(&link_sel).filter_map(|a| a.value().attr("href"));
        let imgs = root.select(&img_sel).filter_map(|img| img.value().attr("src"));
        for src in links.chain(imgs) {
            if let Some(url) = resolve(page_url, src) {
                entry.add_image(&url);
            }
        }
        Ok(())
    }
}
