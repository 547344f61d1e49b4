/*!
 * Length-bounded text chunking.
 *
 * Backends cap the size of a single request, so page text is sliced into
 * chunks of at most `max_chars` characters before submission. Splits prefer
 * the last whitespace inside the limit and fall back to a hard cut when one
 * word is longer than the limit. Lengths are counted in `char`s, so a cut
 * never lands inside a UTF-8 sequence.
 */

/// Split `text` into ordered chunks of at most `max_chars` characters
///
/// Joining the result with single spaces yields the input modulo whitespace
/// normalization. Empty or whitespace-only input yields no chunks.
pub fn split(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        // Byte offset just past the `max_chars`-th character, if the rest is longer
        let limit = match rest.char_indices().nth(max_chars) {
            Some((offset, _)) => offset,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        // A boundary right at the limit counts too
        let cut = if rest[limit..].starts_with(char::is_whitespace) {
            limit
        } else {
            rest[..limit]
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, _)| i)
                .filter(|&i| !rest[..i].trim_end().is_empty())
                .unwrap_or(limit)
        };

        chunks.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    chunks
}

/// Join translated chunks back into one text
pub fn join<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
