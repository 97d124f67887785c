//! Per-graph deltas between two dataset states.
//!
//! A `Delta` maps a graph IRI to an ordered sequence of changesets, each
//! an operation (`additions` / `removals`) with its triples. The
//! operation names surface in provenance IRIs, so they are load-bearing
//! strings. `graph_diff` derives the delta between two instance views
//! deterministically: graphs in ascending IRI order, triples in
//! canonical encoded-line order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Display;

use oxigraph::model::{NamedNode, Triple};

use crate::errors::StoreError;
use crate::rdf::nquads::encode_line;
use crate::store::VirtualGraph;

/// Direction of a changeset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeltaOp {
    Additions,
    Removals,
}

impl DeltaOp {
    /// Lexical name as it appears in provenance IRIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaOp::Additions => "additions",
            DeltaOp::Removals => "removals",
        }
    }
}

impl Display for DeltaOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph IRI → ordered changesets.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    changes: BTreeMap<String, Vec<(DeltaOp, Vec<Triple>)>>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a changeset for `graph_iri`. Empty triple sets are dropped.
    pub fn push(&mut self, graph_iri: &str, op: DeltaOp, triples: Vec<Triple>) {
        if triples.is_empty() {
            return;
        }
        self.changes
            .entry(graph_iri.to_string())
            .or_default()
            .push((op, triples));
    }

    /// Changesets recorded for `graph_iri`.
    pub fn get(&self, graph_iri: &str) -> Option<&[(DeltaOp, Vec<Triple>)]> {
        self.changes.get(graph_iri).map(Vec::as_slice)
    }

    /// Graphs and their changesets in ascending IRI order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[(DeltaOp, Vec<Triple>)])> {
        self.changes
            .iter()
            .map(|(iri, sets)| (iri.as_str(), sets.as_slice()))
    }

    /// True when no changeset carries any triple.
    pub fn is_empty(&self) -> bool {
        self.changes
            .values()
            .flatten()
            .all(|(_, triples)| triples.is_empty())
    }

    /// Number of graphs with recorded changesets.
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Compute the delta turning `old` into `new`, per named graph.
///
/// `None` for `old` means the empty dataset (an initial commit). Graphs
/// and operations without triples are omitted, so an unchanged dataset
/// yields an empty delta.
pub fn graph_diff(old: Option<&VirtualGraph>, new: &VirtualGraph) -> Result<Delta, StoreError> {
    let mut graphs: BTreeSet<String> = new
        .contexts()?
        .into_iter()
        .map(|g| g.into_string())
        .collect();
    if let Some(old) = old {
        graphs.extend(old.contexts()?.into_iter().map(|g| g.into_string()));
    }

    let mut delta = Delta::new();
    for iri in graphs {
        let graph = NamedNode::new_unchecked(iri.clone());
        let old_set: HashSet<Triple> = match old {
            Some(old) => old.triples(graph.as_ref())?.into_iter().collect(),
            None => HashSet::new(),
        };
        let new_set: HashSet<Triple> = new.triples(graph.as_ref())?.into_iter().collect();

        let mut additions: Vec<Triple> = new_set.difference(&old_set).cloned().collect();
        let mut removals: Vec<Triple> = old_set.difference(&new_set).cloned().collect();
        additions.sort_by_cached_key(|t| encode_line(t.as_ref(), graph.as_ref()));
        removals.sort_by_cached_key(|t| encode_line(t.as_ref(), graph.as_ref()));

        delta.push(&iri, DeltaOp::Additions, additions);
        delta.push(&iri, DeltaOp::Removals, removals);
    }
    Ok(delta)
}
