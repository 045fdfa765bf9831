use super::html::{
    block_text, dedupe_by_url, first_match, inline_text, resolve, selector, style_url,
};
use super::GalleryAdapter;
use crate::constants::GALLERY_EUN;
use crate::dates::parse_period;
use crate::error::Result;
use crate::types::ListingEntry;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

const PROFILE_MARKERS: [&str; 2] = ["[ Profile ]", "[프로필]"];
const ARTISTS_MARKER: &str = "참여 작가";

/// 갤러리은: a slick carousel of current shows; images live in inline
/// `background-image` styles.
pub struct GalleryEunAdapter;

impl GalleryEunAdapter {
    pub fn new() -> Self {
        Self
    }

    fn style_images(root: ElementRef, sel: &Selector, page_url: &Url, entry: &mut ListingEntry) {
        for el in root.select(sel) {
            let style = el.value().attr("style").unwrap_or_default();
            if let Some(url) = style_url(style).and_then(|src| resolve(page_url, src)) {
                entry.add_image(&url);
            }
        }
    }

    /// Splits the body into the exhibition text and the participating
    /// artists, dropping the artist profile section.
    fn split_body(full_text: &str) -> (String, Vec<String>) {
        let before_profile = PROFILE_MARKERS
            .iter()
            .find_map(|marker| full_text.split_once(marker).map(|(before, _)| before))
            .unwrap_or(full_text);

        let (description, artist_section) = match before_profile.split_once(ARTISTS_MARKER) {
            Some((before, after)) => (before.trim().to_string(), Some(after)),
            None => (
                before_profile.trim().to_string(),
                full_text.split_once(ARTISTS_MARKER).map(|(_, after)| after),
            ),
        };

        let mut names = Vec::new();
        if let Some(section) = artist_section {
            let joined = section
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            names.extend(
                joined
                    .split(['、', ','])
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from),
            );
        }

        // Solo shows open with "<name> 개인전" or "<name> 초대전"
        if let Some(first) = full_text.lines().map(str::trim).find(|l| !l.is_empty()) {
            let name = first.replace("개인전", "").replace("초대전", "");
            names.push(name.trim().to_string());
        }

        (description, names)
    }
}

impl Default for GalleryEunAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryAdapter for GalleryEunAdapter {
    fn gallery_id(&self) -> &'static str {
        GALLERY_EUN
    }

    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let slide_sel = selector(".slick-list .slick-slide:not(.slick-cloned)")?;
        let link_sel = selector("a")?;
        let title_sel = selector("p.st1 span")?;
        let sub_sel = selector("p.st2")?;
        let thumb_sel = selector(".img_dummy")?;

        let mut entries = Vec::new();
        for slide in document.select(&slide_sel) {
            let Some(url) = first_match(slide, &link_sel)
                .and_then(|a| a.value().attr("href"))
                .and_then(|h| resolve(page_url, h))
            else {
                continue;
            };

            let title = first_match(slide, &title_sel).map(inline_text).unwrap_or_default();
            let mut entry = ListingEntry::new(title, url);

            // Subtitle first, period last; a lone line counts as the period only if it has digits
            let lines: Vec<String> = slide
                .select(&sub_sel)
                .map(inline_text)
                .filter(|t| !t.is_empty())
                .collect();
            let period = match lines.as_slice() {
                [only] if only.chars().any(|c| c.is_ascii_digit()) => Some(only),
                [_, .., last] => Some(last),
                _ => None,
            };
            if let Some(period) = period {
                entry.period_text = period.clone();
                (entry.start_date, entry.end_date) = parse_period(period);
            }

            if let Some(src) = first_match(slide, &thumb_sel)
                .and_then(|d| d.value().attr("style"))
                .and_then(style_url)
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

        let hero_sel = selector(".ex_li .img_dummy")?;
        let gallery_sel = selector(".container .gal_dummy")?;
        Self::style_images(root, &hero_sel, page_url, entry);
        Self::style_images(root, &gallery_sel, page_url, entry);

        // Artwork captions read "<artist>, <work>, <material>"
        let work_sel = selector("a.gallery")?;
        for work in root.select(&work_sel) {
            let caption = work.value().attr("title").unwrap_or_default();
            if let Some(name) = caption.split(',').next() {
                entry.add_artist(name);
            }
        }

        let body_sel = selector(".t_st2")?;
        if let Some(body) = first_match(root, &body_sel) {
            let (description, names) = Self::split_body(&block_text(body));
            entry.raw_description = description;
            for name in names {
                entry.add_artist(&name);
            }
        }

        let address_sel = selector("address")?;
        if let Some(address) = first_match(root, &address_sel) {
            let address = inline_text(address);
            if !address.is_empty() {
                entry.location = Some(address);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_split_drops_profile_and_collects_artists() {
        let text = "김명주 개인전\n전시 서문 내용\n참여 작가\n김명주, 이수진、박하늘\n[ Profile ]\n1980 서울 출생";
        let (description, names) = GalleryEunAdapter::split_body(text);
        assert_eq!(description, "김명주 개인전\n전시 서문 내용");
        assert_eq!(names, vec!["김명주", "이수진", "박하늘", "김명주"]);
    }

    #[test]
    fn body_without_markers_uses_first_line_as_artist() {
        let (description, names) = GalleryEunAdapter::split_body("홍길동 초대전\n작품 설명");
        assert_eq!(description, "홍길동 초대전\n작품 설명");
        assert_eq!(names, vec!["홍길동"]);
    }
}
