use crate::{UrlError, UrlResult};
use url::Url;

/// Exact-match query parameters that carry tracking data rather than identity
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "dclid",
    "msclkid",
    "yclid",
    "mc_cid",
    "mc_eid",
    "igshid",
    "ref",
    "ref_src",
    "cmpid",
    "mkt_tok",
];

/// Prefixes of tracking parameter families
const TRACKING_PREFIXES: &[&str] = &["utm_", "sc_", "_hs", "trk_"];

/// Normalizes an entry link so that cross-source duplicates compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase scheme and host (the parser does both)
/// 3. Remove a leading `www.` from the host
/// 4. Collapse repeated slashes and remove the trailing slash (root stays `/`)
/// 5. Remove the fragment
/// 6. Remove tracking query parameters, sort the rest, drop an empty query
///
/// The scheme is kept: `http://` and `https://` links stay distinct.
///
/// # Examples
///
/// ```
/// use feed_digest::url::normalize_link;
///
/// let url = normalize_link("https://WWW.Example.COM/post/?utm_source=rss#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/post");
/// ```
pub fn normalize_link(link: &str) -> UrlResult<Url> {
    let mut url = Url::parse(link.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    if let Some(stripped) = host.strip_prefix("www.") {
        let stripped = stripped.to_string();
        url.set_host(Some(&stripped))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Lowercases a title and collapses internal whitespace
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
        || TRACKING_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}
