//! Link insertion over segmented text.
//!
//! Text is split once by [`tokenize`]; markup, code and existing wiki links
//! pass through untouched. Keyword linking applies an ordered rule list to
//! plain segments only:
//!
//! 1. documents in corpus order, skipping the page being rendered;
//! 2. per document, each label long enough, then the title if long enough.
//!
//! A span claimed by an earlier rule is never looked at again by a later
//! one. Overlapping keywords therefore link to whichever rule came first.

use regex::Regex;
use tracing::warn;

use crate::config::ZettelkastenConfig;
use crate::model::{Document, Label};
use crate::wiki::links::{label_link_html, title_link_html, wiki_link_html};
use crate::wiki::segment::{Segment, tokenize};

enum Target<'a> {
    Label(&'a Label),
    Title,
}

struct KeywordRule<'a> {
    pattern: Regex,
    page: &'a Document,
    target: Target<'a>,
}

impl KeywordRule<'_> {
    fn anchor(&self, matched: &str, base_path: &str) -> String {
        match self.target {
            Target::Label(label) => label_link_html(matched, label, self.page, base_path),
            Target::Title => title_link_html(matched, self.page, base_path),
        }
    }
}

fn long_enough(keyword: &str, min_len: usize) -> bool {
    !keyword.is_empty() && keyword.chars().count() >= min_len
}

/// Whole-word, case-insensitive matcher for a literal keyword.
fn keyword_pattern(keyword: &str) -> Option<Regex> {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(%keyword, error = %e, "skipping keyword that does not compile");
            None
        }
    }
}

fn keyword_rules<'a>(corpus: &'a [Document], config: &ZettelkastenConfig, self_id: u64) -> Vec<KeywordRule<'a>> {
    let min_len = config.keyword_min_length;
    let mut rules = Vec::new();

    for page in corpus.iter().filter(|doc| doc.id != self_id) {
        for label in page.labels.iter().filter(|l| long_enough(&l.name, min_len)) {
            if let Some(pattern) = keyword_pattern(&label.name) {
                rules.push(KeywordRule { pattern, page, target: Target::Label(label) });
            }
        }
        if long_enough(&page.title, min_len) {
            if let Some(pattern) = keyword_pattern(&page.title) {
                rules.push(KeywordRule { pattern, page, target: Target::Title });
            }
        }
    }
    rules
}

enum Piece {
    Text(String),
    Linked(String),
}

/// Apply every rule to one plain segment and append the result to `out`.
fn link_plain(text: &str, rules: &[KeywordRule<'_>], base_path: &str, out: &mut String) {
    let mut pieces = vec![Piece::Text(text.to_string())];

    for rule in rules {
        let mut next = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let text = match piece {
                Piece::Text(text) => text,
                linked => {
                    next.push(linked);
                    continue;
                }
            };
            let mut last = 0;
            for m in rule.pattern.find_iter(&text) {
                if m.start() > last {
                    next.push(Piece::Text(text[last..m.start()].to_string()));
                }
                next.push(Piece::Linked(rule.anchor(m.as_str(), base_path)));
                last = m.end();
            }
            match last {
                0 => next.push(Piece::Text(text)),
                n if n < text.len() => next.push(Piece::Text(text[n..].to_string())),
                _ => {}
            }
        }
        pieces = next;
    }

    for piece in pieces {
        match piece {
            Piece::Text(s) | Piece::Linked(s) => out.push_str(&s),
        }
    }
}

struct Passes<'a> {
    corpus: &'a [Document],
    base_path: &'a str,
    wiki_links: bool,
    keywords: Option<Vec<KeywordRule<'a>>>,
}

impl Passes<'_> {
    fn run(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for segment in tokenize(text) {
            match segment {
                Segment::WikiLink { target, .. } if self.wiki_links => {
                    out.push_str(&wiki_link_html(target, self.corpus, self.base_path));
                }
                Segment::Plain(plain) => match &self.keywords {
                    Some(rules) if !rules.is_empty() => link_plain(plain, rules, self.base_path, &mut out),
                    _ => out.push_str(plain),
                },
                other => out.push_str(other.as_str()),
            }
        }
        out
    }
}

/// Replace every `[[Title]]` outside code with an anchor.
pub fn convert_wiki_links(text: &str, corpus: &[Document], base_path: &str) -> String {
    Passes { corpus, base_path, wiki_links: true, keywords: None }.run(text)
}

/// Link label and title mentions of other documents. Existing links, markup
/// and code are left byte for byte. A no-op when keyword linking is off.
pub fn auto_link_keywords(
    text: &str,
    corpus: &[Document],
    config: &ZettelkastenConfig,
    base_path: &str,
    self_id: u64,
) -> String {
    if !config.auto_link_keywords {
        return text.to_string();
    }
    let keywords = Some(keyword_rules(corpus, config, self_id));
    Passes { corpus, base_path, wiki_links: false, keywords }.run(text)
}

/// Both passes in a single walk: wiki links become anchors and, when
/// enabled, keywords in the remaining plain text are linked. Returns `text`
/// unchanged when the linking features are disabled.
pub fn rewrite(
    text: &str,
    corpus: &[Document],
    config: &ZettelkastenConfig,
    base_path: &str,
    self_id: u64,
) -> String {
    if !config.enabled {
        return text.to_string();
    }
    let keywords = config.auto_link_keywords.then(|| keyword_rules(corpus, config, self_id));
    Passes { corpus, base_path, wiki_links: true, keywords }.run(text)
}
