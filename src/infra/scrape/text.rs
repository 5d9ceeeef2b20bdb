//! Text cleanup for raw markup chunks.

use html_escape::decode_html_entities;

/// Decode character references, collapse whitespace runs to one space and trim.
///
/// `&nbsp;` decodes to U+00A0, which counts as whitespace here.
pub fn clean_text(raw: &str) -> String {
    decode_html_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
