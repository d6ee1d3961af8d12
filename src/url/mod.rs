//! URL handling module for feed-digest
//!
//! Entry links from different feeds often point at the same article through
//! slightly different URLs. This module reduces them to one canonical form,
//! which the deduplicator hashes into an item identity.

mod normalize;

pub use normalize::{normalize_link, normalize_title};
