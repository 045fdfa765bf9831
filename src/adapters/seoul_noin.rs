use super::html::{first_match, inline_text, resolve, selector, text_lines};
use super::GalleryAdapter;
use crate::constants::SEOUL_NOIN;
use crate::dates::parse_period;
use crate::error::Result;
use crate::types::ListingEntry;
use chrono::NaiveDate;
use reqwest::Url;
use scraper::{ElementRef, Html};

const SUMMARY_HEADING: &str = "전시요약";

/// 탑골미술관: one current exhibition rendered on a single page.
pub struct SeoulNoinAdapter;

impl SeoulNoinAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Every exhibition is shown at the same address, so the opening date
    /// (or the title when no date is printed) goes in the fragment to keep
    /// successive exhibitions apart.
    fn exhibition_url(page_url: &Url, start_date: Option<NaiveDate>, title: &str) -> String {
        let key = start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| title.to_string());
        let mut url = page_url.clone();
        url.set_fragment(Some(&key));
        url.to_string()
    }

    /// The summary sits in the second `div` after its heading; older pages
    /// only have one.
    fn summary_block(heading: ElementRef) -> Option<ElementRef> {
        let mut divs = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "div");
        let first = divs.next();
        divs.next().or(first)
    }
}

impl Default for SeoulNoinAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryAdapter for SeoulNoinAdapter {
    fn gallery_id(&self) -> &'static str {
        SEOUL_NOIN
    }

    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let title_sel = selector("p.fs30.bold.black")?;
        let title = first_match(root, &title_sel).map(inline_text).unwrap_or_default();
        if title.is_empty() {
            return Ok(Vec::new());
        }

        let date_sel = selector(".smInfo1 li.point")?;
        let period_text = first_match(root, &date_sel)
            .map(|date| inline_text(date).replace('\u{a0}', " "))
            .unwrap_or_default();
        let (start_date, end_date) = parse_period(&period_text);

        let mut entry = ListingEntry::new(title.clone(), Self::exhibition_url(page_url, start_date, &title));
        entry.period_text = period_text;
        entry.start_date = start_date;
        entry.end_date = end_date;

        let heading_sel = selector("div.first_title")?;
        let summary = root
            .select(&heading_sel)
            .find(|h| inline_text(*h).contains(SUMMARY_HEADING))
            .and_then(Self::summary_block);
        if let Some(block) = summary {
            entry.raw_description = text_lines(block).join("\n\n");
        }

        let primary_sel = selector("img[alt='전시이미지']")?;
        let upload_sel = selector("img[src*='upload']")?;
        let mut images: Vec<_> = root.select(&primary_sel).collect();
        if images.is_empty() {
            images = root.select(&upload_sel).collect();
        }
        for src in images.iter().filter_map(|img| img.value().attr("src")) {
            if let Some(url) = resolve(page_url, src) {
                entry.add_image(&url);
            }
        }

        Ok(vec![entry])
    }
}
