//! Digest rendering
//!
//! This module handles:
//! - Ordering items into category sections
//! - Rendering the digest as HTML and as plain text
//! - The "no updates" document for empty runs
//!
//! Rendering is pure: the same items and context always produce the same
//! output.

mod html;
mod plain;

pub use html::format_html;
pub use plain::format_plain;

use crate::dedup::DigestItem;
use crate::fetch::FailedSource;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Run facts shown alongside the items
#[derive(Debug, Clone)]
pub struct DigestContext {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub failed_sources: Vec<FailedSource>,
    /// Number of items carrying a fallback summary
    pub fallback_count: usize,
    /// Most sources failed or some summaries fell back
    pub degraded: bool,
    pub time_bounded: bool,
}

impl DigestContext {
    pub fn new(title: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            generated_at,
            failed_sources: Vec::new(),
            fallback_count: 0,
            degraded: false,
            time_bounded: false,
        }
    }

    /// Whether the digest needs a note about missing or degraded content
    pub fn has_notices(&self) -> bool {
        self.degraded
            || !self.failed_sources.is_empty()
            || self.fallback_count > 0
            || self.time_bounded
    }
}

/// A fully rendered digest, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// One category heading and its items, in display order
#[derive(Debug)]
pub struct Section<'a> {
    pub category: &'a str,
    pub items: Vec<&'a DigestItem>,
}

/// Renders items into the subject line, HTML body and plain-text body
///
/// # Arguments
///
/// * `items` - The run's summarized items, in any order
/// * `context` - Title, timestamp and run notices
///
/// # Returns
///
/// The rendered digest; an empty `items` slice yields a "no updates" digest
pub fn render_digest(items: &[DigestItem], context: &DigestContext) -> RenderedDigest {
    let sections = group_sections(items);
    RenderedDigest {
        subject: format_subject(context),
        html: format_html(&sections, context),
        text: format_plain(&sections, context),
    }
}

/// Subject line: the digest title and the run date
pub fn format_subject(context: &DigestContext) -> String {
    format!(
        "{} - {}",
        context.title,
        context.generated_at.format("%B %d, %Y")
    )
}

/// Groups items by category (ascending) and orders each section
///
/// Within a section items are newest first; undated items come last, and
/// ties are broken by id.
pub fn group_sections(items: &[DigestItem]) -> Vec<Section<'_>> {
    let mut ordered: Vec<&DigestItem> = items.iter().collect();
    ordered.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| display_order(a, b)));

    let mut sections: Vec<Section> = Vec::new();
    for item in ordered {
        match sections.last_mut() {
            Some(section) if section.category == item.category => section.items.push(item),
            _ => sections.push(Section {
                category: &item.category,
                items: vec![item],
            }),
        }
    }
    sections
}

fn display_order(a: &DigestItem, b: &DigestItem) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

fn notice_lines(context: &DigestContext) -> Vec<String> {
    let mut lines = Vec::new();
    if context.degraded {
        lines.push("This digest is degraded; parts of it may be incomplete".to_string());
    }
    if !context.failed_sources.is_empty() {
        let names: Vec<&str> = context
            .failed_sources
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        lines.push(format!(
            "{} source(s) could not be fetched: {}",
            names.len(),
            names.join(", ")
        ));
    }
    if context.fallback_count > 0 {
        lines.push(format!(
            "{} item(s) use an excerpt because the summary service was unavailable",
            context.fallback_count
        ));
    }
    if context.time_bounded {
        lines.push("The run hit its time limit; some content may be missing".to_string());
    }
    lines
}
