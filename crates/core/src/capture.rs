//! Placeholder lexer: extracts `{identifier}` tokens from free text.
//!
//! A token is delimited by exactly one opening and one closing brace and its
//! name matches `[A-Za-z0-9.\-_]+`. Anything else -- unbalanced braces,
//! spaces inside the braces -- is not matched and passes through verbatim.
//! Braces do not nest at this level: in `{{name}}` the scanner still finds
//! the inner `{name}`; the filler stage is expected to have consumed doubled
//! braces before interpretation runs.

/// Lazy, finite iterator over placeholder names in a text.
///
/// Restartable by calling [`capture`] again on the same text.
pub struct Capture<'a> {
    text: &'a [u8],
    source: &'a str,
    pos: usize,
}

/// Scan `text` for placeholder tokens.
pub fn capture(text: &str) -> Capture<'_> {
    Capture {
        text: text.as_bytes(),
        source: text,
        pos: 0,
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_'
}

impl<'a> Iterator for Capture<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while self.pos < self.text.len() {
            if self.text[self.pos] != b'{' {
                self.pos += 1;
                continue;
            }
            // Opening brace: take the longest run of name bytes, then
            // require an immediate closing brace.
            let start = self.pos + 1;
            let mut end = start;
            while end < self.text.len() && is_name_byte(self.text[end]) {
                end += 1;
            }
            if end > start && self.text.get(end) == Some(&b'}') {
                self.pos = end + 1;
                return Some(&self.source[start..end]);
            }
            self.pos += 1;
        }
        None
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
