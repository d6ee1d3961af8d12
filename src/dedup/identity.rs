use crate::url::{normalize_link, normalize_title};
use sha2::{Digest, Sha256};

/// What two raw items must share to be the same digest item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemIdentity {
    /// Normalized link; merges across sources
    Link(String),
    /// Normalized title scoped to one source; used when there is no link
    Local { title: String, source_name: String },
}

impl ItemIdentity {
    /// Derives the identity of an entry
    ///
    /// Links that cannot be normalized (odd schemes, unresolvable relative
    /// paths) are compared verbatim after trimming.
    pub fn of(link: Option<&str>, title: &str, source_name: &str) -> Self {
        match link.map(str::trim).filter(|l| !l.is_empty()) {
            Some(link) => match normalize_link(link) {
                Ok(url) => Self::Link(url.to_string()),
                Err(_) => Self::Link(link.to_string()),
            },
            None => Self::Local {
                title: normalize_title(title),
                source_name: source_name.to_string(),
            },
        }
    }

    /// Hex SHA-256 of the identity, used as the digest item id
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            Self::Link(link) => {
                hasher.update(b"link\0");
                hasher.update(link.as_bytes());
            }
            Self::Local { title, source_name } => {
                hasher.update(b"local\0");
                hasher.update(title.as_bytes());
                hasher.update(b"\0");
                hasher.update(source_name.as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}
