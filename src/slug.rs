//! Page identifiers derived from titles.
//!
//! ASCII titles become lowercase hyphenated slugs. Titles containing CJK
//! characters (or nothing slug-worthy at all) keep those characters and
//! are percent-encoded the way a URI component would be. An empty result
//! always becomes `"issue"`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters a URI component leaves as-is besides ASCII alphanumerics.
pub(crate) const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const EMPTY_SLUG: &str = "issue";

/// Percent-encode `raw` as a single URI component.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// CJK punctuation, kana, full/half-width forms and the unified ideograph
/// blocks.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303f}'
        | '\u{3040}'..='\u{309f}'
        | '\u{30a0}'..='\u{30ff}'
        | '\u{ff00}'..='\u{ff9f}'
        | '\u{4e00}'..='\u{9faf}'
        | '\u{3400}'..='\u{4dbf}')
}

/// Lowercase, drop everything `keep` rejects, turn whitespace runs into a
/// single `-`, and strip leading and trailing hyphens.
fn hyphenate(title: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.to_lowercase().chars().filter(|&c| keep(c)) {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out.trim_matches('-').to_string()
}

/// Derive the slug for `title`. Pure: equal titles give equal slugs.
pub fn generate_slug(title: &str) -> String {
    let plain = |c: char| is_word(c) || c.is_whitespace() || c == '-';

    let has_cjk = title.chars().any(is_cjk);
    let nothing_left = title.chars().filter(|&c| plain(c)).collect::<String>().trim().is_empty();

    if has_cjk || nothing_left {
        let slug = hyphenate(title, |c| plain(c) || is_cjk(c));
        if slug.is_empty() {
            return EMPTY_SLUG.to_string();
        }
        return encode_component(&slug);
    }

    let slug = hyphenate(title, plain);
    if slug.is_empty() { EMPTY_SLUG.to_string() } else { slug }
}

/// Fallback identifier for a ticket number.
pub fn slug_from_id(id: u64) -> String {
    format!("issue-{id}")
}
