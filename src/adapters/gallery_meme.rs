use super::html::{
    artist_row_value, dedupe_by_url, first_match, inline_text, resolve, selector, split_names,
    text_lines,
};
use super::GalleryAdapter;
use crate::constants::GALLERY_MEME;
use crate::dates::parse_period;
use crate::error::Result;
use crate::types::ListingEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::Html;

/// A biography line such as "b. 1975 서울" starts the artist CV
static CV_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^b\.\s*\d{4}").unwrap());

const CV_KEYWORDS: [&str; 4] = ["solo exhibition", "group exhibition", "collections", "awards"];

/// 갤러리밈: list of exbView cards, detail pages with a spec table and
/// Hangul-word-processor paragraphs (`p.0`).
pub struct GalleryMemeAdapter;

impl GalleryMemeAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Description paragraphs stop where the artist CV begins.
    fn description_lines(lines: Vec<String>) -> Vec<String> {
        let mut kept = Vec::new();
        for line in lines {
            let lower = line.to_lowercase();
            if CV_START.is_match(&line) || CV_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                break;
            }
            kept.push(line);
        }
        kept
    }
}

impl Default for GalleryMemeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryAdapter for GalleryMemeAdapter {
    fn gallery_id(&self) -> &'static str {
        GALLERY_MEME
    }

    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let item_sel = selector("a[href*='exbView']")?;
        let title_sel = selector(".cur_title")?;
        let artist_sel = selector(".cur_artist")?;
        let cate_sel = selector(".cur_cate")?;
        let date_sel = selector(".cur_date")?;
        let thumb_sel = selector("figure img")?;

        let mut entries = Vec::new();
        for item in document.select(&item_sel) {
            let Some(url) = item.value().attr("href").and_then(|h| resolve(page_url, h)) else {
                continue;
            };

            let title = first_match(item, &title_sel)
                .map(inline_text)
                .unwrap_or_else(|| inline_text(item));
            let mut entry = ListingEntry::new(title, url);

            if let Some(artist) = first_match(item, &artist_sel) {
                for name in split_names(&inline_text(artist)) {
                    entry.add_artist(&name);
                }
            }
            entry.location = first_match(item, &cate_sel)
                .map(inline_text)
                .filter(|c| !c.is_empty());
            if let Some(date) = first_match(item, &date_sel) {
                entry.period_text = inline_text(date);
                (entry.start_date, entry.end_date) = parse_period(&entry.period_text);
            }
            if let Some(src) = first_match(item, &thumb_sel)
                .and_then(|img| img.value().attr("src"))
                .and_then(|src| resolve(page_url, src))
            {
                entry.add_image(&src);
            }
            entries.push(entry);
        }

        Ok(dedupe_by_url(entries))
    }

    fn parse_detail(&self, html: &str, page_url: &Url, entry: &mut ListingEntry) -> Result<()> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        // The detail table is more complete than the card; it replaces the list value
        if let Some(artists) = artist_row_value(root)? {
            let names = split_names(&artists);
            if !names.is_empty() {
                entry.artists.clear();
                for name in names {
                    entry.add_artist(&name);
                }
            }
        }

        let para_sel = selector(r#"p[class="0"]"#)?;
        let lines: Vec<String> = root.select(&para_sel).flat_map(text_lines).collect();
        entry.raw_description = Self::description_lines(lines).join("\n");

        let img_sel = selector("img")?;
        for img in root.select(&img_sel) {
            let src = img.value().attr("src").unwrap_or_default();
            if !src.contains("/upload/") && !src.contains("/data/file") {
                continue;
            }
            if let Some(url) = resolve(page_url, src) {
                entry.add_image(&url);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_stops_at_cv() {
        let lines = vec![
            "전시 소개 첫 문단".to_string(),
            "두 번째 문단".to_string(),
            "b. 1980 서울".to_string(),
            "Solo Exhibitions".to_string(),
        ];
        assert_eq!(
            GalleryMemeAdapter::description_lines(lines),
            vec!["전시 소개 첫 문단".to_string(), "두 번째 문단".to_string()]
        );
    }
}
