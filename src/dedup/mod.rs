//! Cross-source deduplication
//!
//! Raw items are grouped by [`ItemIdentity`]. From each group one item is
//! kept: the one with the longest body, ties broken by registry order and
//! then by content, so the choice never depends on arrival order. The group
//! is attributed to its earliest source in registry order.
//!
//! Items without a link only merge with items of the same source.

mod identity;
mod item;

pub use identity::ItemIdentity;
pub use item::DigestItem;

use crate::fetch::RawItem;
use crate::sources::SourceDescriptor;
use crate::DigestError;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, HashMap, HashSet};

struct Candidate<'a> {
    rank: usize,
    source: Attribution<'a>,
    raw: RawItem,
}

#[derive(Clone, Copy)]
struct Attribution<'a> {
    name: &'a str,
    url: &'a str,
    category: &'a str,
}

/// Merges raw items into digest items with unique ids
///
/// The output is sorted by id. `sources` must be in registry order; items
/// whose `source_url` is not in `sources` rank after every known source and
/// are attributed to their feed URL.
///
/// # Arguments
///
/// * `raw_items` - All fetched items, in any order
/// * `sources` - The run's sources, in registry order
///
/// # Returns
///
/// One digest item per identity, without summaries
pub fn deduplicate(raw_items: Vec<RawItem>, sources: &[SourceDescriptor]) -> Vec<DigestItem> {
    let mut ranks: HashMap<&str, (usize, &SourceDescriptor)> = HashMap::new();
    for (rank, source) in sources.iter().enumerate() {
        ranks.entry(source.url.as_str()).or_insert((rank, source));
    }

    let mut groups: BTreeMap<String, Vec<(usize, Option<&SourceDescriptor>, RawItem)>> =
        BTreeMap::new();
    for raw in raw_items {
        let (rank, source) = match ranks.get(raw.source_url.as_str()) {
            Some((rank, source)) => (*rank, Some(*source)),
            None => (usize::MAX, None),
        };
        let name = source.map_or(raw.source_url.as_str(), |s| s.display_name.as_str());
        let id = ItemIdentity::of(raw.link.as_deref(), &raw.title, name).id();
        groups.entry(id).or_default().push((rank, source, raw));
    }

    groups
        .into_iter()
        .map(|(id, members)| {
            let candidates: Vec<Candidate> = members
                .iter()
                .map(|(rank, source, raw)| Candidate {
                    rank: *rank,
                    source: match source {
                        Some(s) => Attribution {
                            name: &s.display_name,
                            url: &s.url,
                            category: &s.category,
                        },
                        None => Attribution {
                            name: &raw.source_url,
                            url: &raw.source_url,
                            category: "General",
                        },
                    },
                    raw: raw.clone(),
                })
                .collect();
            merge_group(id, candidates)
        })
        .collect()
}

/// Collapses one identity group into a digest item
fn merge_group(id: String, mut candidates: Vec<Candidate>) -> DigestItem {
    candidates.sort_by(keep_order);
    let first_seen = candidates
        .iter()
        .min_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then_with(|| a.source.url.cmp(b.source.url))
        })
        .map(|c| c.source);

    let kept = &candidates[0];
    let source = first_seen.unwrap_or(kept.source);

    if candidates.len() > 1 {
        tracing::debug!(
            "Merged {} copies of '{}' (attributed to {})",
            candidates.len(),
            kept.raw.title,
            source.name
        );
    }

    DigestItem {
        id,
        source_name: source.name.to_string(),
        source_url: source.url.to_string(),
        category: source.category.to_string(),
        title: kept.raw.title.clone(),
        link: kept.raw.link.clone(),
        summary: None,
        summary_is_fallback: false,
        published_at: kept.raw.published_at,
        body: kept.raw.raw_body.clone(),
    }
}

/// Total order choosing the kept item: longest body first
fn keep_order(a: &Candidate, b: &Candidate) -> Ordering {
    let key = |c: &Candidate| {
        (
            Reverse(c.raw.raw_body.chars().count()),
            c.rank,
            c.raw.title.clone(),
            c.raw.link.clone(),
            c.raw.raw_body.clone(),
            c.raw.published_at,
        )
    };
    key(a).cmp(&key(b))
}

/// Checks that no two items share an id
///
/// A duplicate here is a programming error and aborts the run.
pub fn verify_unique_ids(items: &[DigestItem]) -> Result<(), DigestError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(DigestError::DuplicateItemId(item.id.clone()));
        }
    }
    Ok(())
}

/// Keeps the `max_items` newest items
///
/// Undated items rank after dated ones; ties are broken by id. Returns the
/// kept items in that order and the number dropped.
pub fn limit_newest(mut items: Vec<DigestItem>, max_items: usize) -> (Vec<DigestItem>, usize) {
    items.sort_by(|a, b| {
        b.published_at
            .is_some()
            .cmp(&a.published_at.is_some())
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    let dropped = items.len().saturating_sub(max_items);
    items.truncate(max_items);
    (items, dropped)
}
