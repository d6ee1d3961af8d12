//! HTML digest body

use crate::dedup::DigestItem;
use crate::output::{notice_lines, DigestContext, Section};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Formats the digest sections as a standalone HTML document
///
/// All feed-provided text is escaped; links are only emitted for http(s)
/// URLs.
///
/// # Arguments
///
/// * `sections` - Category sections in display order
/// * `context` - Title, timestamp and run notices
///
/// # Returns
///
/// An HTML string
pub fn format_html(sections: &[Section], context: &DigestContext) -> String {
    let mut html = String::new();
    let title = encode_text(&context.title);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str("</head>\n<body style=\"font-family: sans-serif; max-width: 720px;\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", title));
    html.push_str(&format!(
        "<p><em>{}</em></p>\n",
        context.generated_at.format("%B %d, %Y %H:%M UTC")
    ));

    let notices = notice_lines(context);
    if !notices.is_empty() {
        html.push_str("<div class=\"notices\">\n<ul>\n");
        for notice in &notices {
            html.push_str(&format!("<li>{}</li>\n", encode_text(notice)));
        }
        html.push_str("</ul>\n</div>\n");
    }

    if sections.is_empty() {
        html.push_str("<p>No updates today. None of the feeds had new entries.</p>\n");
    }

    for section in sections {
        html.push_str(&format!("<h2>{}</h2>\n<ul>\n", encode_text(section.category)));
        for item in &section.items {
            format_item(&mut html, item);
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn format_item(html: &mut String, item: &DigestItem) {
    html.push_str("<li>\n");

    let title = encode_text(&item.title);
    match item.link.as_deref().filter(|l| is_web_link(l)) {
        Some(link) => html.push_str(&format!(
            "<strong><a href=\"{}\">{}</a></strong>",
            encode_double_quoted_attribute(link),
            title
        )),
        None => html.push_str(&format!("<strong>{}</strong>", title)),
    }

    html.push_str(&format!(" <small>{}", encode_text(&item.source_name)));
    if let Some(published) = item.published_at {
        html.push_str(&format!(", {}", published.format("%Y-%m-%d")));
    }
    html.push_str("</small>\n");

    html.push_str(&format!("<p>{}</p>\n", encode_text(item.summary_text())));
    html.push_str("</li>\n");
}

fn is_web_link(link: &str) -> bool {
    link.starts_with("https://") || link.starts_with("http://")
}
