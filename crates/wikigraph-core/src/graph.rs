use crate::note::{Note, NoteId};
use crate::wikilink::link_targets;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NoteId,
    pub title: String,
    pub link_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: NoteId,
    pub target: NoteId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Undirected edges, one per linked pair. Self links and unresolved titles are dropped.
pub fn build_link_graph(notes: &[Note]) -> LinkGraph {
    let by_title = notes
        .iter()
        .map(|note| (note.title.to_lowercase(), &note.id))
        .collect::<HashMap<_, _>>();

    let mut counts: HashMap<&NoteId, usize> = HashMap::new();
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for note in notes {
        for title in link_targets(&note.content) {
            let Some(&target) = by_title.get(&title.to_lowercase()) else {
                continue;
            };
            if target == &note.id {
                continue;
            }

            let key = if note.id <= *target {
                (note.id.clone(), target.clone())
            } else {
                (target.clone(), note.id.clone())
            };
            if !seen.insert(key) {
                continue;
            }

            edges.push(GraphEdge {
                source: note.id.clone(),
                target: target.clone(),
            });
            *counts.entry(&note.id).or_insert(0) += 1;
            *counts.entry(target).or_insert(0) += 1;
        }
    }

    let nodes = notes
        .iter()
        .map(|note| GraphNode {
            id: note.id.clone(),
            title: note.title.clone(),
            link_count: counts.get(&note.id).copied().unwrap_or(0),
        })
        .collect();

    LinkGraph { nodes, edges }
}
