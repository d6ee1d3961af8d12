//! Prompt construction and summary bounding

use crate::dedup::DigestItem;

const FALLBACK_PLACEHOLDER: &str = "No summary available.";

/// Builds the user prompt for one item
///
/// The entry body is cut to `max_input_chars` characters so long articles
/// stay inside the provider's context budget.
pub fn build_prompt(item: &DigestItem, max_input_chars: usize, max_words: usize) -> String {
    let (body, _) = truncate_chars(&item.body, max_input_chars);
    let mut prompt = format!(
        "Summarize the following article in at most {} words.\n\nTitle: {}\nSource: {}\n",
        max_words, item.title, item.source_name
    );
    if let Some(link) = &item.link {
        prompt.push_str(&format!("Link: {}\n", link));
    }
    if let Some(published) = item.published_at {
        prompt.push_str(&format!("Published: {}\n", published.format("%Y-%m-%d %H:%M UTC")));
    }
    prompt.push_str("\nContent:\n");
    prompt.push_str(if body.is_empty() { item.title.as_str() } else { body });
    prompt
}

/// Cuts text to at most `max_chars` characters on a char boundary
///
/// Returns the prefix and whether anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (&text[..end], true),
        None => (text, false),
    }
}

/// Bounds text to `max_words` words, marking a cut with "..."
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    format!("{}...", words[..max_words].join(" "))
}

/// Deterministic stand-in summary built from the item itself
///
/// Uses the leading `max_chars` characters of the body (cut back to a word
/// boundary), or the title when the body is empty. Never empty.
pub fn fallback_summary(item: &DigestItem, max_chars: usize, max_words: usize) -> String {
    let source = if item.body.trim().is_empty() {
        item.title.trim()
    } else {
        item.body.trim()
    };
    if source.is_empty() {
        return FALLBACK_PLACEHOLDER.to_string();
    }

    let (prefix, cut) = truncate_chars(source, max_chars);
    let text = if cut {
        let at_word = prefix
            .rfind(char::is_whitespace)
            .map(|i| &prefix[..i])
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(prefix);
        format!("{}...", at_word.trim_end())
    } else {
        prefix.to_string()
    };

    truncate_words(&text, max_words)
}
