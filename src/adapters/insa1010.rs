use super::html::{
    block_text, clean_line, dedupe_by_url, first_match, inline_text, resolve, selector,
};
use super::GalleryAdapter;
use crate::constants::INSA1010;
use crate::error::Result;
use crate::types::ListingEntry;
use reqwest::Url;
use scraper::Html;

const IMAGE_PREFIX: &str = "https://cdn.imweb.me/upload/";

/// 인사1010: imweb board rendered client side. The text is loose enough that
/// this gallery relies on AI extraction for dates and artists.
pub struct Insa1010Adapter;

impl Insa1010Adapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Insa1010Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryAdapter for Insa1010Adapter {
    fn gallery_id(&self) -> &'static str {
        INSA1010
    }

    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let card_link_sel = selector("div.list-style a[href]")?;
        let view_link_sel = selector("a[href*='bmode=view']")?;

        let mut links: Vec<_> = document
            .select(&card_link_sel)
            .filter(|a| a.value().attr("href").is_some_and(|h| h.contains("bmode=view")))
            .collect();
        if links.is_empty() {
            links = document.select(&view_link_sel).collect();
        }

        let mut entries = Vec::new();
        for link in links {
            // Fragments only scroll the page; they identify the same post
            let href = link
                .value()
                .attr("href")
                .and_then(|h| h.split('#').next())
                .unwrap_or_default();
            let Some(url) = resolve(page_url, href) else {
                continue;
            };
            entries.push(ListingEntry::new(inline_text(link), url));
        }

        Ok(dedupe_by_url(entries))
    }

    fn parse_detail(&self, html: &str, _page_url: &Url, entry: &mut ListingEntry) -> Result<()> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        if entry.title.is_empty() {
            let h1_sel = selector("h1")?;
            let og_sel = selector("meta[property='og:title']")?;
            entry.title = first_match(root, &h1_sel)
                .map(inline_text)
                .filter(|t| !t.is_empty())
                .or_else(|| {
                    first_match(root, &og_sel)
                        .and_then(|m| m.value().attr("content"))
                        .map(clean_line)
                })
                .unwrap_or_default();
        }

        let artist_sel = selector("h5, h6")?;
        if let Some(artist) = first_match(root, &artist_sel) {
            entry.add_artist(&inline_text(artist));
        }

        let text_sel = selector("div.fusion-text.fusion-text-2 p")?;
        let p_sel = selector("p")?;
        let mut paragraphs: Vec<String> = root
            .select(&text_sel)
            .map(block_text)
            .filter(|t| !t.is_empty())
            .collect();
        if paragraphs.is_empty() {
            paragraphs = root
                .select(&p_sel)
                .map(block_text)
                .filter(|t| !t.is_empty())
                .collect();
        }
        entry.raw_description = paragraphs.join("\n");

        let img_sel = selector("img[src]")?;
        for src in root.select(&img_sel).filter_map(|img| img.value().attr("src")) {
            let src = src.trim();
            if src.starts_with(IMAGE_PREFIX) {
                entry.add_image(src);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragments_and_dedupes_links() {
        let html = r#"<div class="list-style">
            <a href="/28/?bmode=view&idx=101#top">봄의 색</a>
            <a href="/28/?bmode=view&idx=101">봄의 색</a>
            <a href="/28/?q=search">검색</a>
        </div>"#;
        let url = Url::parse("https://www.insa1010.com/28").unwrap();
        let entries = Insa1010Adapter::new().parse_listing(html, &url).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_url, "https://www.insa1010.com/28/?bmode=view&idx=101");
        assert_eq!(entries[0].title, "봄의 색");
    }

    #[test]
    fn detail_falls_back_to_og_title() {
        let html = r#"<html><head><meta property="og:title" content=" 겨울 정원 "></head>
            <body><p>전시 소개</p><img src="https://cdn.imweb.me/upload/a.jpg"><img src="/logo.png"></body></html>"#;
        let url = Url::parse("https://www.insa1010.com/28/?bmode=view&idx=7").unwrap();
        let mut entry = ListingEntry::new("", url.as_str());
        Insa1010Adapter::new().parse_detail(html, &url, &mut entry).unwrap();
        assert_eq!(entry.title, "겨울 정원");
        assert_eq!(entry.raw_description, "전시 소개");
        assert_eq!(entry.image_urls, vec!["https://cdn.imweb.me/upload/a.jpg".to_string()]);
    }
}
