//! Built-in random filler text generator.
//!
//! Replaces `{{category.field}}` tokens with randomly generated text from
//! small built-in corpora. This runs *before* placeholder interpretation on
//! each template leaf, so doubled braces mean "generate a random value" and
//! the single-brace tokens that remain mean "substitute a concrete value
//! from the request". Unknown categories pass through verbatim.

use rand::seq::SliceRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Björn", "Carmen", "Dmitri", "Elena", "Femi", "Grace", "Hiro", "Imani", "Jonas",
    "Katya", "Luis", "Mira", "Noor", "Otto", "Priya",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Becker", "Chen", "Diallo", "Eriksen", "Fontaine", "García", "Haddad", "Ito",
    "Jensen", "Kowalski", "Lindqvist", "Moreau", "Novak", "Okafor", "Petrov",
];

const DOMAINS: &[&str] = &[
    "example.com", "example.org", "example.net", "mail.test", "post.test",
];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
    "tempor", "incididunt", "labore", "magna", "aliqua", "veniam", "nostrud",
];

/// Replace every recognized `{{category.field}}` token in `template`.
pub fn fill(template: &str) -> String {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'{' && bytes.get(pos + 1) == Some(&b'{') {
            let start = pos + 2;
            let mut end = start;
            while end < bytes.len() && is_name_byte(bytes[end]) {
                end += 1;
            }
            if end > start
                && bytes.get(end) == Some(&b'}')
                && bytes.get(end + 1) == Some(&b'}')
            {
                let name = &template[start..end];
                match generate(name) {
                    Some(text) => out.push_str(&text),
                    // unknown category: keep the token as written
                    None => out.push_str(&template[pos..end + 2]),
                }
                pos = end + 2;
                continue;
            }
        }
        // not at a doubled-brace token: copy one char
        let ch_len = utf8_len(bytes[pos]);
        out.push_str(&template[pos..pos + ch_len]);
        pos += ch_len;
    }
    out
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_'
}

fn utf8_len(first: u8) -> usize {
    match first {
        b if b & 0b1110_0000 == 0b1100_0000 => 2,
        b if b & 0b1111_0000 == 0b1110_0000 => 3,
        b if b & 0b1111_1000 == 0b1111_0000 => 4,
        _ => 1,
    }
}

fn generate(name: &str) -> Option<String> {
    let mut rng = rand::thread_rng();
    let pick = |corpus: &[&str]| -> String {
        corpus.choose(&mut rand::thread_rng()).copied().unwrap_or("").to_string()
    };
    match name {
        "name.first" => Some(pick(FIRST_NAMES)),
        "name.last" => Some(pick(LAST_NAMES)),
        "name.full" => Some(format!("{} {}", pick(FIRST_NAMES), pick(LAST_NAMES))),
        "internet.domain" => Some(pick(DOMAINS)),
        "internet.email" => Some(format!(
            "{}.{}@{}",
            ascii_lower(&pick(FIRST_NAMES)),
            ascii_lower(&pick(LAST_NAMES)),
            pick(DOMAINS)
        )),
        "lorem.word" => Some(pick(WORDS)),
        "lorem.sentence" => {
            let count = rng.gen_range(6..=12);
            let mut words: Vec<String> = (0..count).map(|_| pick(WORDS)).collect();
            if let Some(first) = words.first_mut() {
                let mut chars = first.chars();
                if let Some(c) = chars.next() {
                    *first = c.to_uppercase().collect::<String>() + chars.as_str();
                }
            }
            Some(format!("{}.", words.join(" ")))
        }
        "number.digit" => Some(rng.gen_range(0..10u8).to_string()),
        "number.integer" => Some(rng.gen_range(0..100_000u32).to_string()),
        _ => None,
    }
}

/// Lowercase and strip to ASCII letters, for email local parts.
fn ascii_lower(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
