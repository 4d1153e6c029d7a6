//! Pages that mention the current page.

use serde::Serialize;

use crate::model::Document;
use crate::wiki::links::extract_wiki_links;

/// Characters of context kept on each side of the first mention.
pub const CONTEXT_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlink {
    pub title: String,
    pub slug: String,
    pub issue_id: u64,
    /// Page URL under the configured base path.
    pub url: String,
    pub context: String,
    /// The current page links back with `[[title]]`.
    pub is_bidirectional: bool,
}

/// One backlink per other document whose body contains `current.title`
/// literally, in corpus order.
pub fn collect_backlinks(current: &Document, corpus: &[Document], base_path: &str) -> Vec<Backlink> {
    if current.title.is_empty() {
        return Vec::new();
    }
    let outgoing = extract_wiki_links(&current.body);

    corpus
        .iter()
        .filter(|doc| doc.id != current.id)
        .filter_map(|doc| {
            let context = mention_context(&doc.body, &current.title, CONTEXT_CHARS)?;
            let slug = doc.slug();
            Some(Backlink {
                title: doc.title.clone(),
                url: format!("{base_path}/wiki/{slug}"),
                slug,
                issue_id: doc.id,
                context,
                is_bidirectional: outgoing.iter().any(|target| *target == doc.title),
            })
        })
        .collect()
}

/// `radius` characters either side of the first `keyword`, with `...` where
/// the window was cut. `None` when `keyword` does not occur.
pub fn mention_context(body: &str, keyword: &str, radius: usize) -> Option<String> {
    let index = body.find(keyword)?;
    let end_of_match = index + keyword.len();

    let start = match radius {
        0 => index,
        _ => body[..index].char_indices().rev().nth(radius - 1).map_or(0, |(i, _)| i),
    };
    let end = body[end_of_match..]
        .char_indices()
        .nth(radius)
        .map_or(body.len(), |(i, _)| end_of_match + i);

    let mut context = String::with_capacity(end - start + 6);
    if start > 0 {
        context.push_str("...");
    }
    context.push_str(&body[start..end]);
    if end < body.len() {
        context.push_str("...");
    }
    Some(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::doc;

    #[test]
    fn plain_mention_is_one_way() {
        let a = doc(1, "Alpha", "intro");
        let corpus = vec![a.clone(), doc(3, "Gamma", "talks about Alpha a lot")];
        let links = collect_backlinks(&a, &corpus, "/w");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].issue_id, 3);
        assert_eq!(links[0].slug, "gamma");
        assert_eq!(links[0].url, "/w/wiki/gamma");
        assert_eq!(links[0].context, "talks about Alpha a lot");
        assert!(!links[0].is_bidirectional);
    }

    #[test]
    fn reciprocal_wiki_link_is_bidirectional() {
        let a = doc(1, "Alpha", "see [[Beta]]");
        let corpus = vec![a.clone(), doc(2, "Beta", "refers to [[Alpha]]")];
        let links = collect_backlinks(&a, &corpus, "");
        assert!(links[0].is_bidirectional);
    }

    #[test]
    fn one_backlink_per_document_in_corpus_order() {
        let a = doc(1, "Alpha", "");
        let corpus = vec![
            doc(5, "E", "Alpha Alpha Alpha"),
            a.clone(),
            doc(2, "B", "nothing here"),
            doc(4, "D", "[[Alpha]]"),
        ];
        let ids: Vec<u64> = collect_backlinks(&a, &corpus, "").iter().map(|b| b.issue_id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[test]
    fn empty_title_has_no_backlinks() {
        let a = doc(1, "", "");
        let corpus = vec![a.clone(), doc(2, "B", "anything")];
        assert!(collect_backlinks(&a, &corpus, "").is_empty());
    }

    #[test]
    fn context_is_cut_with_ellipses() {
        let body = format!("{}Alpha{}", "x".repeat(60), "y".repeat(60));
        let context = mention_context(&body, "Alpha", 50).unwrap();
        assert_eq!(context, format!("...{}Alpha{}...", "x".repeat(50), "y".repeat(50)));
    }

    #[test]
    fn context_counts_characters_not_bytes() {
        let body = format!("{}Alpha{}", "日".repeat(3), "本".repeat(3));
        assert_eq!(mention_context(&body, "Alpha", 2).unwrap(), "...日日Alpha本本...");
        assert_eq!(mention_context(&body, "Alpha", 3).unwrap(), body);
    }

    #[test]
    fn missing_keyword_has_no_context() {
        assert!(mention_context("nothing", "Alpha", 50).is_none());
    }
}
