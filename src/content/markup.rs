/*!
 * Markup stripping shared by the integrity and quality checks.
 *
 * Lesson content and email bodies arrive as HTML fragments with
 * `{{...}}` template placeholders that are substituted at render time.
 * Both must be reduced to line-preserving plain text before any
 * language or structure heuristic runs, so that tags and placeholder
 * names are never scored as content.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex for template placeholders like `{{first_name}}`
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{[^{}]*\}\}").expect("Invalid placeholder regex")
});

/// Regex for block-level tags that imply a line break
static BLOCK_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:p|div|br|li|ul|ol|h[1-6]|tr|table|thead|tbody|blockquote|pre|section|article|header|footer)(?:\s[^>]*)?/?>")
        .expect("Invalid block tag regex")
});

/// Regex for any remaining tag
static ANY_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("Invalid tag regex")
});

/// Strip markup into line-preserving plain text.
///
/// Template placeholders are removed first, block-level tags become
/// newlines, every other tag becomes a space, common HTML entities are
/// decoded, and whitespace is collapsed within each line. Blank lines
/// are dropped.
pub fn strip_markup(raw: &str) -> String {
    let without_placeholders = PLACEHOLDER_REGEX.replace_all(raw, " ");
    let with_breaks = BLOCK_TAG_REGEX.replace_all(&without_placeholders, "\n");
    let without_tags = ANY_TAG_REGEX.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&without_tags);

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the handful of entities that actually occur in authored content
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
}
