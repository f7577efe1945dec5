//! HTML sanitization and plain-text projection.
//!
//! Scraped markup arrives full of scripts, ad units, and consent popups.
//! [`clean_html`] re-serializes a fragment while dropping those subtrees;
//! [`strip_html`] reduces markup to collapsed plain text for prompts,
//! excerpts, and word counts.

use scraper::{ElementRef, Html};

/// Elements serialized without children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Remove non-content subtrees from an HTML fragment and re-serialize it.
///
/// Dropped: `script`, `style`, `iframe`, `noscript`, elements with an
/// `advertisement` or `ad` class, and elements whose class attribute
/// mentions `cookie` or `popup`. Comments are dropped as a side effect of
/// re-serialization.
pub fn clean_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

/// Reduce markup to plain text with runs of whitespace collapsed to a
/// single space.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain-text preview of `html`, at most `max_chars` bytes plus an
/// ellipsis when truncated.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = strip_html(html);
    if text.len() <= max_chars {
        return text;
    }
    format!("{}...", truncate_chars(&text, max_chars))
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn should_drop(element: &scraper::node::Element) -> bool {
    if matches!(element.name(), "script" | "style" | "iframe" | "noscript") {
        return true;
    }
    if element
        .classes()
        .any(|class| class.eq_ignore_ascii_case("advertisement") || class.eq_ignore_ascii_case("ad"))
    {
        return true;
    }
    if let Some(class) = element.attr("class") {
        let class = class.to_ascii_lowercase();
        if class.contains("cookie") || class.contains("popup") {
            return true;
        }
    }
    false
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if should_drop(child_element.value()) {
                continue;
            }
            write_element(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            escape_text(&text.text, out);
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&name) {
        return;
    }
    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_scripts_and_styles() {
        let html = "<p>keep</p><script>alert(1)</script><style>p{}</style><p>also</p>";
        let cleaned = clean_html(html);
        assert_eq!(cleaned, "<p>keep</p><p>also</p>");
    }

    #[test]
    fn removes_ad_and_popup_classes() {
        let html = concat!(
            "<div class=\"ad\">buy</div>",
            "<div class=\"advertisement\">buy more</div>",
            "<div class=\"cookie-banner\">accept</div>",
            "<div class=\"newsletter-popup\">subscribe</div>",
            "<p class=\"lead\">content</p>",
        );
        let cleaned = clean_html(html);
        assert_eq!(cleaned, "<p class=\"lead\">content</p>");
    }

    #[test]
    fn keeps_nested_structure_and_attributes() {
        let html = "<article><h2 id=\"a\">Head</h2><p>Body <em>text</em></p></article>";
        let cleaned = clean_html(html);
        assert_eq!(cleaned, html);
    }

    #[test]
    fn drops_nested_noise_inside_kept_elements() {
        let html = "<div><p>text</p><noscript>no js</noscript><iframe src=\"x\"></iframe></div>";
        assert_eq!(clean_html(html), "<div><p>text</p></div>");
    }

    #[test]
    fn void_elements_serialize_without_close_tag() {
        let html = "<p>line<br>break <img src=\"i.png\"></p>";
        let cleaned = clean_html(html);
        assert_eq!(cleaned, "<p>line<br>break <img src=\"i.png\"></p>");
    }

    #[test]
    fn strip_collapses_whitespace() {
        assert_eq!(strip_html("<p>one   two</p>\n<p>three</p>"), "one two three");
        assert_eq!(strip_html("<p>one two three</p>"), "one two three");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn excerpt_truncates_with_ellipsis() {
        let short = excerpt("<p>tiny</p>", 200);
        assert_eq!(short, "tiny");

        let long_source = format!("<p>{}</p>", "word ".repeat(100));
        let long = excerpt(&long_source, 20);
        assert!(long.ends_with("..."));
        assert!(long.len() <= 23);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let truncated = truncate_chars(text, 2);
        assert_eq!(truncated, "h");
        assert_eq!(truncate_chars(text, 100), text);
    }
}
