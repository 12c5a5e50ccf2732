//! Knowledge graph extraction from source summaries.
//!
//! [`HeuristicGraphExtractor`] works without an NLP model: runs of
//! capitalised words become entities, consecutive entities within a sentence
//! are linked by the words between them, and a text with entities but no
//! sentence-level link falls back to pairwise `co_occurs` edges.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Relation label used when nothing meaningful sits between two entities.
pub const RELATED_TO: &str = "related_to";

/// Relation label for the co-occurrence fallback.
pub const CO_OCCURS: &str = "co_occurs";

/// Relation labels are cut to this many characters.
const MAX_RELATION_CHARS: usize = 40;

/// Words dropped from relation labels.
const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "of", "and", "to", "in", "for", "with", "on", "as", "by", "from",
];

/// An entity in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Lowercased, whitespace-collapsed label.
    pub id: String,
    /// Label as first seen.
    pub label: String,
    /// Entity type.
    pub kind: String,
}

/// A directed, labelled link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Entities and relations found across a set of texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Builds a [`KnowledgeGraph`] from a batch of texts.
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    /// Extract entities and relations from `texts`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if the extraction backend fails.
    async fn extract(&self, texts: &[String]) -> Result<KnowledgeGraph>;
}

/// Capitalisation-based entity and relation extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicGraphExtractor;

/// Token span `[start, end)` of one entity inside a sentence.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

impl HeuristicGraphExtractor {
    /// Synchronous form of [`GraphExtractor::extract`].
    pub fn extract_sync(texts: &[String]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::default();
        let mut node_ids: HashSet<String> = HashSet::new();
        let mut seen_edges: HashSet<GraphEdge> = HashSet::new();

        for text in texts.iter().filter(|t| !t.trim().is_empty()) {
            let mut text_nodes: Vec<GraphNode> = Vec::new();
            let mut text_edges: Vec<GraphEdge> = Vec::new();

            for sentence in text.split(['.', '!', '?', '\n']) {
                let tokens: Vec<&str> = sentence.split_whitespace().collect();
                let spans = entity_spans(&tokens);

                for span in &spans {
                    let label = entity_label(&tokens, *span);
                    let id = node_id(&label);
                    if !text_nodes.iter().any(|n| n.id == id) {
                        text_nodes.push(GraphNode {
                            id,
                            label,
                            kind: "entity".into(),
                        });
                    }
                }

                for pair in spans.windows(2) {
                    let source = node_id(&entity_label(&tokens, pair[0]));
                    let target = node_id(&entity_label(&tokens, pair[1]));
                    if source == target {
                        continue;
                    }
                    let between = tokens[pair[0].end..pair[1].start].join(" ");
                    text_edges.push(GraphEdge {
                        source,
                        target,
                        relation: relation_label(&between),
                    });
                }
            }

            if text_edges.is_empty() && text_nodes.len() >= 2 {
                text_edges = cooccurrence_edges(&text_nodes);
            }

            for node in text_nodes {
                if node_ids.insert(node.id.clone()) {
                    graph.nodes.push(node);
                }
            }
            for edge in text_edges {
                if seen_edges.insert(edge.clone()) {
                    graph.edges.push(edge);
                }
            }
        }

        graph
    }
}

#[async_trait]
impl GraphExtractor for HeuristicGraphExtractor {
    async fn extract(&self, texts: &[String]) -> Result<KnowledgeGraph> {
        Ok(Self::extract_sync(texts))
    }
}

fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_capitalised(token: &str) -> bool {
    clean_token(token)
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
}

/// Maximal runs of capitalised tokens. A run stops after a token carrying a
/// clause separator. A lone capitalised first word is sentence case, not an
/// entity.
fn entity_spans(tokens: &[&str]) -> Vec<Span> {
    let first_word = tokens.iter().position(|t| !clean_token(t).is_empty());
    let mut spans = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if !is_capitalised(tokens[i]) {
            i += 1;
            continue;
        }
        let start = i;
        loop {
            let closes = tokens[i].ends_with([',', ';', ':']);
            i += 1;
            if closes || i >= tokens.len() || !is_capitalised(tokens[i]) {
                break;
            }
        }
        if Some(start) == first_word && i == start + 1 {
            continue;
        }
        spans.push(Span { start, end: i });
    }
    spans
}

fn entity_label(tokens: &[&str], span: Span) -> String {
    tokens[span.start..span.end]
        .iter()
        .map(|t| clean_token(t))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn node_id(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn relation_label(between: &str) -> String {
    let lowered = between.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '/'))
        .collect();
    let words: Vec<&str> = kept
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect();
    if words.is_empty() {
        return RELATED_TO.into();
    }
    words.join(" ").chars().take(MAX_RELATION_CHARS).collect()
}

fn cooccurrence_edges(nodes: &[GraphNode]) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            edges.push(GraphEdge {
                source: a.id.clone(),
                target: b.id.clone(),
                relation: CO_OCCURS.into(),
            });
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn links_consecutive_entities_in_a_sentence() {
        let graph = HeuristicGraphExtractor::extract_sync(&texts(&[
            "Researchers at Google DeepMind partnered with the European Bioinformatics Institute.",
        ]));
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["google deepmind", "european bioinformatics institute"]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, "google deepmind");
        assert_eq!(graph.edges[0].target, "european bioinformatics institute");
        assert_eq!(graph.edges[0].relation, "partnered");
    }

    #[test]
    fn sentence_initial_word_is_not_an_entity() {
        let graph = HeuristicGraphExtractor::extract_sync(&texts(&["Today we visited Paris."]));
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["paris"]);
    }

    #[test]
    fn empty_between_text_is_related_to() {
        let graph = HeuristicGraphExtractor::extract_sync(&texts(&["We met Alice, Bob and friends."]));
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].relation, RELATED_TO);
    }

    #[test]
    fn falls_back_to_cooccurrence_across_sentences() {
        let graph = HeuristicGraphExtractor::extract_sync(&texts(&[
            "The lab is in Boston. Funding came from NASA.",
        ]));
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].relation, CO_OCCURS);
    }

    #[test]
    fn nodes_and_edges_are_deduplicated_across_texts() {
        let text = "Work by Marie Curie inspired Albert Einstein.";
        let graph = HeuristicGraphExtractor::extract_sync(&texts(&[text, text]));
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn blank_texts_yield_empty_graph() {
        let graph = HeuristicGraphExtractor::extract_sync(&texts(&["", "   "]));
        assert!(graph.is_empty());
    }

    #[test]
    fn relation_label_drops_fillers_and_truncates() {
        assert_eq!(relation_label("is the director of"), "is director");
        let long = "word ".repeat(20);
        assert_eq!(relation_label(&long).chars().count(), MAX_RELATION_CHARS);
    }
}
