//! Name cleanup, normalization and pattern substitution.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Longest name (in characters) accepted for address generation.
pub const MAX_NAME_LEN: usize = 30;

/// Anything after one of these is a headline or employer, not the name.
const NAME_SEPARATORS: &[&str] = &[" - ", " | ", " • "];

/// A run of credentials at the end of the name. Only trailing tokens count,
/// so a given name or surname that happens to spell a title is kept.
static TITLE_SUFFIXES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[\s,]+(?:ph\.?\s?d\.?|mba|pmp|cpa|cfa|cissp|cisa|cism|cspo|csm|psm|shrm-s?cp|s?phr|acca|frm|capm|itil|esq\.?))+[\s,.]*$",
    )
    .unwrap()
});

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

fn is_emoji_or_symbol(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF   // emoji, pictographs, flags
        | 0x2600..=0x27BF   // misc symbols, dingbats
        | 0x2B00..=0x2BFF   // arrows, stars
        | 0xFE00..=0xFE0F   // variation selectors
        | 0x200D            // zero-width joiner
    ) || matches!(c, '®' | '™' | '©' | '℠' | '✓' | '✔' | '★' | '☆' | '•' | '|')
}

/// Strips decoration from a display name as scraped from a profile headline.
///
/// `clean_name("Mohit Bhatia PMP®") == "Mohit Bhatia"`. Separators only match
/// with surrounding spaces, so hyphenated names such as `Jean-Luc` survive.
pub fn clean_name(raw: &str) -> String {
    let mut name = raw;
    for sep in NAME_SEPARATORS {
        if let Some(idx) = name.find(sep) {
            name = &name[..idx];
        }
    }

    let without_symbols: String = name.chars().filter(|c| !is_emoji_or_symbol(*c)).collect();
    let without_parens = PARENTHESIZED.replace_all(&without_symbols, " ");
    let without_titles = TITLE_SUFFIXES.replace(&without_parens, " ");

    without_titles
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c == '.' || c == '-' || c.is_whitespace())
        .to_string()
}

/// Splits a cleaned full name into (first, last); the last name keeps every
/// token after the first.
pub fn split_full_name(full_name: &str) -> Option<(String, String)> {
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next()?.to_string();
    let rest = tokens.collect::<Vec<_>>().join(" ");
    if rest.is_empty() {
        None
    } else {
        Some((first, rest))
    }
}

/// Lowercases, strips diacritics and joins whitespace runs with `-`.
/// Rejects empty input, commas, and names over [`MAX_NAME_LEN`] characters.
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || name.contains(',') || name.chars().count() > MAX_NAME_LEN {
        return None;
    }

    let folded: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(fold_special)
        .collect();

    Some(folded.split_whitespace().collect::<Vec<_>>().join("-"))
}

/// Letters that carry no combining mark after decomposition.
fn fold_special(c: char) -> Vec<char> {
    match c {
        'ß' => vec!['s', 's'],
        'æ' => vec!['a', 'e'],
        'œ' => vec!['o', 'e'],
        'ø' => vec!['o'],
        'ł' => vec!['l'],
        'đ' => vec!['d'],
        other => vec![other],
    }
}

/// Fills a domain pattern with a person's name.
///
/// Each of `{first}`, `{last}`, `{f}`, `{l}` is replaced once, in that order.
pub fn generate_email(first: &str, last: &str, pattern: &str, domain: &str) -> Option<String> {
    let first = normalize_name(first)?;
    let last = normalize_name(last)?;
    let domain = domain.trim().to_lowercase();
    let pattern = pattern.trim();
    if domain.is_empty() || pattern.is_empty() {
        return None;
    }

    let f = first.chars().next()?.to_string();
    let l = last.chars().next()?.to_string();

    let local = pattern
        .replacen("{first}", &first, 1)
        .replacen("{last}", &last, 1)
        .replacen("{f}", &f, 1)
        .replacen("{l}", &l, 1);

    Some(format!("{local}@{domain}"))
}
