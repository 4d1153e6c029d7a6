//! `[[Title]]` extraction and the anchor markup every link pass emits.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Document, Label};
use crate::slug::{encode_component, generate_slug};

static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("wiki link pattern is valid"));

/// Targets of every `[[...]]` in `text`, in order, duplicates kept.
pub fn extract_wiki_links(text: &str) -> Vec<&str> {
    WIKI_LINK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// `true` when `text` contains the literal reference `[[title]]`.
pub fn contains_wiki_link(text: &str, title: &str) -> bool {
    text.contains(&format!("[[{title}]]"))
}

/// Anchor for `[[target]]`: the page when a document has exactly that
/// title, a "create page" link otherwise.
///
/// `target` may come from rendered HTML, so character references are
/// decoded before the title lookup and the anchor text is escaped again.
pub fn wiki_link_html(target: &str, corpus: &[Document], base_path: &str) -> String {
    let title = unescape_html(target);
    let text = escape_html(&title);
    match corpus.iter().find(|doc| doc.title == *title) {
        Some(doc) => format!(
            r#"<a href="{base_path}/wiki/{}" class="wiki-link">{text}</a>"#,
            doc.slug()
        ),
        None => format!(
            r#"<a href="{base_path}/wiki/new?title={}" class="wiki-link wiki-link-new">{text}</a>"#,
            encode_component(&title)
        ),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len()), |mut escaped, ch| {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
        escaped
    })
}

/// Decode the references a markdown renderer emits for text. `&amp;` goes
/// last so `&amp;lt;` stays `&lt;`.
pub(crate) fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&#x27;", "'")
            .replace("&amp;", "&"),
    )
}

/// Keyword anchor for a label match, underlined in the label's color.
pub fn label_link_html(matched: &str, label: &Label, page: &Document, base_path: &str) -> String {
    format!(
        r#"<a href="{base_path}/wiki/{}" class="keyword-link label-link" style="border-bottom-color: #{};">{matched}</a>"#,
        page.slug(),
        label.color
    )
}

/// Keyword anchor for a title match.
pub fn title_link_html(matched: &str, page: &Document, base_path: &str) -> String {
    format!(r#"<a href="{base_path}/wiki/{}" class="keyword-link">{matched}</a>"#, generate_slug(&page.title))
}
