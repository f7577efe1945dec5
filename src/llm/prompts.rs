//! Prompt assembly for article enhancement.

use crate::content::sanitize::{strip_html, truncate_chars};
use crate::models::ReferenceDocument;

/// System role instruction sent alongside every enhancement request.
pub const SYSTEM_PROMPT: &str = "You are an expert content writer and SEO specialist. \
     Rewrite articles to improve quality, readability, and SEO while maintaining the core message.";

/// Plain-text budget for the original article inside the prompt.
const ORIGINAL_EXCERPT_CHARS: usize = 3000;

/// Plain-text budget per reference article.
const REFERENCE_EXCERPT_CHARS: usize = 1500;

/// Build the rewriting prompt from the original article and its references.
///
/// Markup is stripped before budgeting so tag soup never eats into the
/// excerpt allowance. References are numbered in collection order; a run
/// without references simply omits that section.
pub fn build_enhancement_prompt(original_html: &str, references: &[ReferenceDocument]) -> String {
    let original = strip_html(original_html);

    let mut prompt = format!(
        "Rewrite this article to match the style, formatting, and structure of \
         top-ranking articles. Maintain the core message but improve readability and SEO.\n\n\
         ORIGINAL ARTICLE:\n{}\n\n",
        truncate_chars(&original, ORIGINAL_EXCERPT_CHARS)
    );

    if !references.is_empty() {
        prompt.push_str("REFERENCE ARTICLES (top-ranking content for inspiration):\n\n");

        for (index, reference) in references.iter().enumerate() {
            let text = strip_html(&reference.content);
            prompt.push_str(&format!(
                "Reference {} ({}):\n{}\n\n",
                index + 1,
                reference.title,
                truncate_chars(&text, REFERENCE_EXCERPT_CHARS)
            ));
        }
    }

    prompt.push_str(
        "\nINSTRUCTIONS:\n\
         1. Rewrite the original article with improved structure and flow\n\
         2. Use clear headings (H2, H3) for better organization\n\
         3. Make it more engaging and reader-friendly\n\
         4. Add relevant keywords naturally for SEO\n\
         5. Keep the tone professional but conversational\n\
         6. Maintain factual accuracy from the original\n\
         7. Output in clean HTML format with proper tags (<h2>, <p>, <ul>, etc.)\n\
         8. Aim for similar or slightly longer length than original\n\n\
         Enhanced article:",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(title: &str, content: &str) -> ReferenceDocument {
        ReferenceDocument {
            url: "https://ref.example/post".to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn prompt_includes_original_and_instructions() {
        let prompt = build_enhancement_prompt("<p>Short original body</p>", &[]);

        assert!(prompt.contains("ORIGINAL ARTICLE:\nShort original body"));
        assert!(prompt.contains("1. Rewrite the original article"));
        assert!(prompt.ends_with("Enhanced article:"));
        assert!(!prompt.contains("REFERENCE ARTICLES"));
    }

    #[test]
    fn references_are_numbered_in_order() {
        let refs = vec![
            reference("First", "<p>alpha</p>"),
            reference("Second", "<p>beta</p>"),
        ];
        let prompt = build_enhancement_prompt("<p>body</p>", &refs);

        assert!(prompt.contains("Reference 1 (First):\nalpha"));
        assert!(prompt.contains("Reference 2 (Second):\nbeta"));
        let first = prompt.find("Reference 1").unwrap();
        let second = prompt.find("Reference 2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn long_original_is_truncated_to_budget() {
        let long = format!("<p>{}</p>", "word ".repeat(2000));
        let prompt = build_enhancement_prompt(&long, &[]);

        let body_start = prompt.find("ORIGINAL ARTICLE:\n").unwrap() + "ORIGINAL ARTICLE:\n".len();
        let body_end = prompt.find("\n\n\nINSTRUCTIONS").unwrap();
        let body = &prompt[body_start..body_end];
        assert!(body.len() <= 3000);
    }

    #[test]
    fn reference_markup_is_stripped() {
        let refs = vec![reference("Ref", "<div><p>visible</p></div>")];
        let prompt = build_enhancement_prompt("<p>body</p>", &refs);

        assert!(prompt.contains("visible"));
        assert!(!prompt.contains("<div>"));
    }
}
