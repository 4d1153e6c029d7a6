//! Corpus-wide relation graph.
//!
//! Built in two phases so that keyword relations can see every explicit
//! link, whichever document declared it:
//!
//! 1. explicit links: one `direct` edge per resolved `[[...]]` occurrence,
//!    repeats and self-links included, plus one `bidirectional` edge per
//!    reciprocally linked pair, emitted from the lower id;
//! 2. mentions: a `keyword` edge `target → source` when `target`'s body
//!    contains `source`'s title and the pair has no explicit link.
//!
//! Only explicit links suppress a mention, so two documents that name each
//! other without linking get a keyword edge in each direction.
//!
//! The mention phase compares every pair of documents, so cost grows with
//! the square of the corpus. Title lookups and the explicit-pair check are
//! hashed. Fine for a few hundred pages; beyond that the mention scan needs
//! an index.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::Document;
use crate::wiki::links::{contains_wiki_link, extract_wiki_links};

/// Node color when a document has no labels.
pub const DEFAULT_NODE_COLOR: &str = "#cccccc";

const MIN_NODE_WEIGHT: usize = 1;
const MAX_NODE_WEIGHT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Direct,
    Bidirectional,
    Keyword,
}

impl RelationKind {
    pub fn weight(self) -> u32 {
        match self {
            RelationKind::Direct => 3,
            RelationKind::Bidirectional => 5,
            RelationKind::Keyword => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub source: u64,
    pub target: u64,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub weight: u32,
}

impl Relation {
    fn new(source: u64, target: u64, kind: RelationKind) -> Self {
        Self { source, target, kind, weight: kind.weight() }
    }

    pub fn touches(&self, id: u64) -> bool {
        self.source == id || self.target == id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub color: String,
    /// Relations touching this node, clamped to 1..=10.
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Relation>,
}

fn unordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Build nodes and edges for the whole corpus. Explicit-link edges come
/// first, in corpus order, followed by keyword edges.
pub fn build_graph(corpus: &[Document]) -> KnowledgeGraph {
    let mut by_title: HashMap<&str, &Document> = HashMap::with_capacity(corpus.len());
    for doc in corpus {
        by_title.entry(doc.title.as_str()).or_insert(doc);
    }

    let mut edges = Vec::new();
    let mut linked: HashSet<(u64, u64)> = HashSet::new();
    let mut reciprocal: HashSet<(u64, u64)> = HashSet::new();

    for source in corpus {
        for title in extract_wiki_links(&source.body) {
            let Some(target) = by_title.get(title) else { continue };
            edges.push(Relation::new(source.id, target.id, RelationKind::Direct));
            linked.insert(unordered(source.id, target.id));

            if source.id < target.id
                && contains_wiki_link(&target.body, &source.title)
                && reciprocal.insert((source.id, target.id))
            {
                edges.push(Relation::new(source.id, target.id, RelationKind::Bidirectional));
            }
        }
    }

    for source in corpus.iter().filter(|doc| !doc.title.is_empty()) {
        for target in corpus {
            if target.id == source.id || linked.contains(&unordered(source.id, target.id)) {
                continue;
            }
            if target.body.contains(source.title.as_str()) {
                edges.push(Relation::new(target.id, source.id, RelationKind::Keyword));
            }
        }
    }

    // A self-link touches its node once.
    let mut degree: HashMap<u64, usize> = HashMap::new();
    for edge in &edges {
        *degree.entry(edge.source).or_default() += 1;
        if edge.target != edge.source {
            *degree.entry(edge.target).or_default() += 1;
        }
    }

    let nodes = corpus
        .iter()
        .map(|doc| {
            let first = doc.labels.first();
            let touching = degree.get(&doc.id).copied().unwrap_or(0);
            GraphNode {
                id: doc.id,
                title: doc.title.clone(),
                slug: doc.slug(),
                category: first.map(|l| l.name.clone()),
                color: first.map_or_else(|| DEFAULT_NODE_COLOR.to_string(), |l| format!("#{}", l.color)),
                weight: touching.clamp(MIN_NODE_WEIGHT, MAX_NODE_WEIGHT) as u32,
            }
        })
        .collect();

    KnowledgeGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{doc, doc_with_labels, label};

    fn kinds(graph: &KnowledgeGraph) -> Vec<(u64, u64, RelationKind)> {
        graph.edges.iter().map(|e| (e.source, e.target, e.kind)).collect()
    }

    #[test]
    fn reciprocal_links_give_one_bidirectional_edge() {
        let corpus = vec![doc(1, "Alpha", "see [[Beta]]"), doc(2, "Beta", "refers to [[Alpha]]")];
        let graph = build_graph(&corpus);
        assert_eq!(
            kinds(&graph),
            vec![
                (1, 2, RelationKind::Direct),
                (1, 2, RelationKind::Bidirectional),
                (2, 1, RelationKind::Direct),
            ]
        );
        let bidi = &graph.edges[1];
        assert_eq!(bidi.weight, 5);
        assert_eq!(graph.edges[0].weight, 3);
    }

    #[test]
    fn bidirectional_source_is_lower_id_regardless_of_order() {
        let corpus = vec![doc(9, "Beta", "[[Alpha]]"), doc(4, "Alpha", "[[Beta]]")];
        let graph = build_graph(&corpus);
        let bidi: Vec<_> = graph.edges.iter().filter(|e| e.kind == RelationKind::Bidirectional).collect();
        assert_eq!(bidi.len(), 1);
        assert_eq!((bidi[0].source, bidi[0].target), (4, 9));
    }

    #[test]
    fn every_link_occurrence_is_a_direct_edge() {
        let corpus = vec![doc(1, "Alpha", "[[Beta]] and [[Beta]]"), doc(2, "Beta", "")];
        let graph = build_graph(&corpus);
        assert_eq!(kinds(&graph), vec![(1, 2, RelationKind::Direct), (1, 2, RelationKind::Direct)]);
        let weights: Vec<_> = graph.nodes.iter().map(|n| (n.id, n.weight)).collect();
        assert_eq!(weights, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn self_links_count_once_toward_node_weight() {
        let corpus = vec![doc(1, "Alpha", "[[Alpha]] [[Alpha]] [[Missing]]"), doc(2, "Beta", "")];
        let graph = build_graph(&corpus);
        assert_eq!(kinds(&graph), vec![(1, 1, RelationKind::Direct), (1, 1, RelationKind::Direct)]);
        assert_eq!(graph.nodes[0].weight, 2);
        assert_eq!(graph.nodes[1].weight, 1);
    }

    #[test]
    fn repeated_reciprocal_links_keep_one_bidirectional_edge() {
        let corpus = vec![doc(1, "Alpha", "[[Beta]] [[Beta]]"), doc(2, "Beta", "[[Alpha]]")];
        let graph = build_graph(&corpus);
        assert_eq!(
            kinds(&graph),
            vec![
                (1, 2, RelationKind::Direct),
                (1, 2, RelationKind::Bidirectional),
                (1, 2, RelationKind::Direct),
                (2, 1, RelationKind::Direct),
            ]
        );
    }

    #[test]
    fn mutual_mentions_give_keyword_edges_both_ways() {
        let corpus = vec![doc(1, "Alpha", "about Beta"), doc(2, "Beta", "about Alpha")];
        assert_eq!(
            kinds(&build_graph(&corpus)),
            vec![(2, 1, RelationKind::Keyword), (1, 2, RelationKind::Keyword)]
        );
    }

    #[test]
    fn keyword_edge_points_from_mentioner_to_mentioned() {
        let corpus = vec![doc(1, "Alpha", ""), doc(2, "Beta", "Alpha is nice")];
        let graph = build_graph(&corpus);
        assert_eq!(kinds(&graph), vec![(2, 1, RelationKind::Keyword)]);
        assert_eq!(graph.edges[0].weight, 1);
    }

    #[test]
    fn keyword_never_shadows_an_explicit_link() {
        // Alpha mentions Beta by name, but Beta links to Alpha later in the corpus.
        let corpus = vec![doc(1, "Alpha", "Beta rocks"), doc(2, "Beta", "[[Alpha]]")];
        let graph = build_graph(&corpus);
        assert_eq!(kinds(&graph), vec![(2, 1, RelationKind::Direct)]);
    }

    #[test]
    fn nodes_take_first_label_and_clamped_weight() {
        let hub_body: String = (2..=13).map(|i| format!("[[T{i}]] ")).collect();
        let mut corpus = vec![doc_with_labels(
            1,
            "Hub",
            &hub_body,
            vec![label("guide", "0e8a16"), label("bug", "d73a4a")],
        )];
        corpus.extend((2..=13).map(|i| doc(i, &format!("T{i}"), "")));
        corpus.push(doc(99, "Lonely", ""));

        let graph = build_graph(&corpus);
        let hub = &graph.nodes[0];
        assert_eq!(hub.category.as_deref(), Some("guide"));
        assert_eq!(hub.color, "#0e8a16");
        assert_eq!(hub.weight, 10);

        let lonely = graph.nodes.iter().find(|n| n.id == 99).unwrap();
        assert_eq!(lonely.weight, 1);
        assert_eq!(lonely.color, DEFAULT_NODE_COLOR);
        assert!(lonely.category.is_none());
        assert!(graph.nodes.iter().all(|n| (1..=10).contains(&n.weight)));
    }

    #[test]
    fn serializes_for_the_graph_view() {
        let corpus = vec![doc(1, "Alpha", ""), doc(2, "Beta", "Alpha")];
        let json = serde_json::to_value(build_graph(&corpus)).unwrap();
        assert_eq!(json["edges"][0]["type"], "keyword");
        assert_eq!(json["edges"][0]["weight"], 1);
        assert_eq!(json["nodes"][0]["slug"], "alpha");
        assert!(json["nodes"][0].get("category").is_none());
    }
}
