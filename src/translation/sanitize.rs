/*!
 * Text sanitization for the output renderer.
 *
 * The PDF writer draws with the base-14 fonts, which only cover a narrow
 * code-point range. Characters outside that range make rendering fail, so
 * text is cleaned twice: before translation and again before rendering.
 * This is lossy for non-Latin scripts; `max_code_point` controls the range.
 */

/// Highest code point the default renderer can draw
pub const ASCII_MAX: u32 = 0x7F;

/// Typographic characters with a plain replacement
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
];

/// Replace typographic punctuation and drop characters above `max_code_point`
///
/// Line breaks are kept; other control characters are dropped.
pub fn sanitize(text: &str, max_code_point: u32) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some((_, replacement)) = REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else if c == '\n' || c == '\t' || (!c.is_control() && (c as u32) <= max_code_point) {
            out.push(c);
        }
    }
    out
}

/// Collapse all runs of whitespace to single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
