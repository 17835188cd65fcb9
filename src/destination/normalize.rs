//! Input normalization shared by queries, gazetteer aliases and the
//! suggestion index.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize free text for matching.
///
/// Lowercases, strips diacritics (NFKD, combining marks dropped), folds the
/// few letters NFKD leaves intact, removes apostrophes, turns other
/// punctuation into spaces (hyphens are kept) and collapses whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.nfkd().filter(|c| !is_combining_mark(*c)) {
        for lc in c.to_lowercase() {
            match lc {
                'ø' => out.push('o'),
                'æ' => out.push_str("ae"),
                'œ' => out.push_str("oe"),
                'ß' => out.push_str("ss"),
                'ł' => out.push('l'),
                'đ' => out.push('d'),
                'ı' => out.push('i'),
                '\'' | '\u{2019}' | '`' => {}
                '-' => out.push('-'),
                c if c.is_alphanumeric() => out.push(c),
                _ => out.push(' '),
            }
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the normalized text looks like a 3-letter IATA code.
pub fn looks_like_code(normalized: &str) -> bool {
    normalized.len() == 3 && normalized.chars().all(|c| c.is_ascii_alphabetic())
}
