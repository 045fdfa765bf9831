use super::html::{
    artist_row_value, block_text, dedupe_by_url, first_match, inline_text, resolve, selector,
    split_names, text_lines,
};
use super::GalleryAdapter;
use crate::constants::INSA_ART;
use crate::dates::parse_period;
use crate::error::Result;
use crate::types::ListingEntry;
use reqwest::Url;
use scraper::Html;
use tracing::debug;

/// Only images uploaded to the exhibition board belong to the exhibition
const IMAGE_PATH_KEYWORD: &str = "/data/file/exhibition_current/";

/// 인사아트센터: gnuboard gallery list with a spec table per item.
pub struct InsaArtAdapter;

impl InsaArtAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InsaArtAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryAdapter for InsaArtAdapter {
    fn gallery_id(&self) -> &'static str {
        INSA_ART
    }

    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let item_sel = selector("div.gall_text_href")?;
        let link_sel = selector("a.bo_tit")?;
        let row_sel = selector(".list-spec table tr")?;

        let mut entries = Vec::new();
        for item in document.select(&item_sel) {
            let Some(link) = first_match(item, &link_sel) else {
                continue;
            };
            let Some(url) = link.value().attr("href").and_then(|h| resolve(page_url, h)) else {
                continue;
            };

            let rows: Vec<String> = item.select(&row_sel).map(inline_text).collect();
            let mut entry = ListingEntry::new(inline_text(link), url);
            if let Some(period) = rows.first() {
                entry.period_text = period.clone();
                (entry.start_date, entry.end_date) = parse_period(period);
            }
            entry.location = rows.get(1).filter(|h| !h.is_empty()).cloned();
            entries.push(entry);
        }

        debug!("Parsed {} listing items", entries.len());
        Ok(dedupe_by_url(entries))
    }

    fn parse_detail(&self, html: &str, page_url: &Url, entry: &mut ListingEntry) -> Result<()> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let spec_sel = selector("div.spec")?;
        if let Some(spec) = first_match(root, &spec_sel) {
            if let Some(artists) = artist_row_value(spec)? {
                for name in split_names(&artists) {
                    entry.add_artist(&name);
                }
            }
        }

        let content_sel = selector("#bo_v_con, .bo_v_con")?;
        let p_sel = selector("p")?;
        let paragraphs: Vec<String> = match first_match(root, &content_sel) {
            Some(content) => {
                let ps: Vec<String> = content.select(&p_sel).map(block_text).filter(|t| !t.is_empty()).collect();
                if ps.is_empty() {
                    text_lines(content)
                } else {
                    ps
                }
            }
            None => root.select(&p_sel).map(block_text).filter(|t| !t.is_empty()).collect(),
        };
        entry.raw_description = paragraphs.join("\n");

        let gallery_sel = selector("#img-gallery li")?;
        let img_sel = selector("img")?;
        for li in root.select(&gallery_sel) {
            let src = li
                .value()
                .attr("data-src")
                .or_else(|| first_match(li, &img_sel).and_then(|img| img.value().attr("src")))
                .unwrap_or_default()
                .trim();
            if !src.contains(IMAGE_PATH_KEYWORD) {
                continue;
            }
            if let Some(url) = resolve(page_url, src) {
                entry.add_image(&url);
            }
        }
        Ok(())
    }
}
