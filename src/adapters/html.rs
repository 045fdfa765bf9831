//! Small helpers shared by the gallery adapters.

use crate::error::{Result, ScraperError};
use crate::types::ListingEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;

static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).unwrap());

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::Parse(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Text of an element with runs of whitespace collapsed to single spaces.
pub fn inline_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Non-empty trimmed lines of an element, one per text node or line break.
pub fn text_lines(el: ElementRef) -> Vec<String> {
    el.text()
        .flat_map(|t| t.lines())
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Lines of an element joined by newlines.
pub fn block_text(el: ElementRef) -> String {
    text_lines(el).join("\n")
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim whitespace plus the zero-width characters some site builders emit.
pub fn clean_line(s: &str) -> String {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}' || c == '\u{200b}')
        .to_string()
}

pub fn first_match<'a>(scope: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    scope.select(sel).next()
}

/// Resolve a possibly relative link against the page it came from.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// First `url(...)` inside an inline style attribute.
pub fn style_url(style: &str) -> Option<&str> {
    CSS_URL
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Split an artist field such as "김철수, 이영희、박민수" into names.
pub fn split_names(text: &str) -> Vec<String> {
    text.split([',', '、', '/'])
        .map(collapse_whitespace)
        .filter(|n| !n.is_empty())
        .collect()
}

/// Label/value rows (`th`/`td` pairs) whose label mentions an artist.
pub fn artist_row_value(scope: ElementRef) -> Result<Option<String>> {
    let rows = selector("tr")?;
    let cells = selector("th, td")?;
    for row in scope.select(&rows) {
        let values: Vec<_> = row.select(&cells).collect();
        if values.len() < 2 {
            continue;
        }
        let label = inline_text(values[0]);
        if label.contains("작가") || label.contains("Artist") {
            return Ok(Some(inline_text(values[1])));
        }
    }
    Ok(None)
}

/// Keep the first entry per source URL, preserving order.
pub fn dedupe_by_url(entries: Vec<ListingEntry>) -> Vec<ListingEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.source_url.clone()))
        .collect()
}
