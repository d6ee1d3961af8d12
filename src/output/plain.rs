//! Plain-text digest body

use crate::output::{notice_lines, DigestContext, Section};

/// Formats the digest sections as plain text
pub fn format_plain(sections: &[Section], context: &DigestContext) -> String {
    let mut text = String::new();

    text.push_str(&context.title);
    text.push('\n');
    text.push_str(&"=".repeat(context.title.chars().count()));
    text.push('\n');
    text.push_str(&format!(
        "{}\n\n",
        context.generated_at.format("%B %d, %Y %H:%M UTC")
    ));

    let notices = notice_lines(context);
    for notice in &notices {
        text.push_str(&format!("! {}\n", notice));
    }
    if !notices.is_empty() {
        text.push('\n');
    }

    if sections.is_empty() {
        text.push_str("No updates today. None of the feeds had new entries.\n");
        return text;
    }

    for section in sections {
        text.push_str(section.category);
        text.push('\n');
        text.push_str(&"-".repeat(section.category.chars().count()));
        text.push_str("\n\n");

        for item in &section.items {
            text.push_str(&format!("* {} ({}", item.title, item.source_name));
            if let Some(published) = item.published_at {
                text.push_str(&format!(", {}", published.format("%Y-%m-%d")));
            }
            text.push_str(")\n");
            if let Some(link) = &item.link {
                text.push_str(&format!("  {}\n", link));
            }
            text.push_str(&format!("  {}\n\n", item.summary_text()));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::group_sections;
    use crate::output::tests::{context, item};

    #[test]
    fn test_empty_digest_says_no_updates() {
        let text = format_plain(&[], &context());
        assert!(text.starts_with("Daily Feed Digest\n================="));
        assert!(text.contains("No updates today"));
    }

    #[test]
    fn test_items_listed_under_categories() {
        let items = vec![item("a", "AI", Some(1)), item("b", "AI", None)];

        let text = format_plain(&group_sections(&items), &context());

        assert!(text.contains("AI\n--\n"));
        assert!(text.contains("* Post a (Example Blog, 2025-06-01)\n  https://example.com/a\n  Summary of a."));
        assert!(text.find("Post a") < text.find("Post b"));
    }

    #[test]
    fn test_notices_listed_first() {
        let mut ctx = context();
        ctx.fallback_count = 1;
        let items = vec![item("a", "AI", Some(1))];

        let text = format_plain(&group_sections(&items), &ctx);
        assert!(text.find("! 1 item(s)") < text.find("AI\n"));
    }
}
