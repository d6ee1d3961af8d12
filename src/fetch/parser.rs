//! Feed document parsing
//!
//! Turns an RSS/Atom document into [`RawItem`]s:
//! - picks the entry's alternate link, resolved against the feed URL
//! - reduces HTML titles and bodies to plain text
//! - applies the source's keyword filter and per-source entry cap

use crate::fetch::types::RawItem;
use crate::sources::SourceDescriptor;
use feed_rs::model::{Entry, Link};
use scraper::Html;
use url::Url;

/// Parses a feed document into raw items for one source
///
/// Entries are kept in feed order. Keyword filtering happens before the cap,
/// so a source with keywords contributes up to `max_items` matching entries.
///
/// # Arguments
///
/// * `content` - The raw feed document
/// * `source` - The source the document was fetched for
/// * `max_items` - Maximum number of entries to keep
///
/// # Returns
///
/// * `Ok(Vec<RawItem>)` - Parsed entries (possibly empty)
/// * `Err(String)` - The document is not a readable RSS/Atom feed
pub fn parse_feed(
    content: &[u8],
    source: &SourceDescriptor,
    max_items: usize,
) -> Result<Vec<RawItem>, String> {
    let feed = feed_rs::parser::parse(content).map_err(|e| e.to_string())?;
    let base = Url::parse(&source.url).ok();

    let items = feed
        .entries
        .into_iter()
        .map(|entry| entry_to_item(entry, source, base.as_ref()))
        .filter(|item| matches_any_keyword(item, &source.keywords))
        .take(max_items)
        .collect();

    Ok(items)
}

fn entry_to_item(entry: Entry, source: &SourceDescriptor, base: Option<&Url>) -> RawItem {
    let title = entry
        .title
        .as_ref()
        .map(|t| html_to_text(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let link = select_link(&entry.links)
        .or_else(|| permalink_id(&entry.id))
        .and_then(|href| resolve_link(&href, base));

    let body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
        .map(|b| html_to_text(&b))
        .unwrap_or_default();

    RawItem {
        source_url: source.url.clone(),
        title,
        link,
        published_at: entry.published.or(entry.updated),
        raw_body: body,
    }
}

/// Picks the entry's page link: `alternate` (or unlabelled) first, then any link
fn select_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// RSS `guid` values are often the permalink itself
fn permalink_id(id: &str) -> Option<String> {
    let id = id.trim();
    (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
}

fn resolve_link(href: &str, base: Option<&Url>) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
        }
        Err(_) => None,
    }
}

/// Reduces an HTML fragment to whitespace-collapsed plain text
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn matches_any_keyword(item: &RawItem, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", item.title, item.raw_body).to_lowercase();
    keywords.iter().any(|query| matches_query(&haystack, query))
}

/// Matches a keyword query against lowercased text
///
/// A single word must appear as a whole word; a multi-word query matches
/// when every word appears as a whole word, in any order.
pub fn matches_query(text: &str, query: &str) -> bool {
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    !words.is_empty() && words.iter().all(|word| contains_word(text, word))
}

fn contains_word(text: &str, word: &str) -> bool {
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';

    text.match_indices(word).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + word.len()..].chars().next();
        let starts_clean = !word.starts_with(is_word_char) || !before.map_or(false, is_word_char);
        let ends_clean = !word.ends_with(is_word_char) || !after.map_or(false, is_word_char);
        starts_clean && ends_clean
    })
}
