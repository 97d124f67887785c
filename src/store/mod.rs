//! Queryable quad-store surfaces.
//!
//! Two concrete views implement the same capability set:
//!
//! * [`MemoryStore`]: the mutable provenance dataset the hydrator and
//!   synthesiser write into. Provenance descriptions live in the default
//!   graph; persisted file content and operation triples live in named
//!   graphs.
//! * [`VirtualGraph`]: a materialised, aggregated read view over a set
//!   of member graphs, built per commit by the instance builder.
//!
//! The "present graph X under identifier Y" pattern is a projection, not
//! a storage type: [`rewritten_quads`] translates the graph slot on read.

use std::collections::BTreeSet;

use oxigraph::model::{GraphName, NamedNode, NamedNodeRef, Quad, QuadRef, Triple};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::errors::StoreError;

/// SPARQL surface shared by every graph-like view.
pub trait Queryable {
    /// Evaluate a SELECT / ASK / CONSTRUCT query.
    fn query(&self, query: &str) -> Result<QueryResults, StoreError>;

    /// Apply a SPARQL update. `versioning` is advisory for the embedding
    /// front-end; the views themselves apply the update either way.
    fn update(&self, update: &str, versioning: bool) -> Result<(), StoreError>;
}

/// The in-memory provenance dataset.
pub struct MemoryStore {
    store: Store,
}

impl MemoryStore {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// The underlying quad store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn insert(&self, quad: QuadRef<'_>) -> Result<(), StoreError> {
        self.store.insert(quad)?;
        Ok(())
    }

    pub fn insert_quads(&self, quads: impl IntoIterator<Item = Quad>) -> Result<(), StoreError> {
        for quad in quads {
            self.store.insert(quad.as_ref())?;
        }
        Ok(())
    }

    pub fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StoreError> {
        Ok(self.store.remove(quad)?)
    }

    /// Distinct graph names with at least one quad, the default graph
    /// included when populated.
    pub fn contexts(&self) -> Result<Vec<GraphName>, StoreError> {
        contexts_of(&self.store)
    }

    /// Drop every context. `rebuild` wipes the dataset this way before
    /// replaying the history.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.store.is_empty()?)
    }
}

impl Queryable for MemoryStore {
    fn query(&self, query: &str) -> Result<QueryResults, StoreError> {
        Ok(self.store.query(query)?)
    }

    fn update(&self, update: &str, _versioning: bool) -> Result<(), StoreError> {
        self.store.update(update)?;
        Ok(())
    }
}

/// Materialised aggregate over member graphs, queryable as one dataset.
pub struct VirtualGraph {
    store: Store,
}

impl VirtualGraph {
    /// Build the aggregate from member quads.
    pub fn from_quads(quads: impl IntoIterator<Item = Quad>) -> Result<Self, StoreError> {
        let store = Store::new()?;
        for quad in quads {
            store.insert(quad.as_ref())?;
        }
        Ok(Self { store })
    }

    /// Named graphs present in the aggregate, ascending IRI order.
    pub fn contexts(&self) -> Result<Vec<NamedNode>, StoreError> {
        let mut iris = BTreeSet::new();
        for context in contexts_of(&self.store)? {
            if let GraphName::NamedNode(n) = context {
                iris.insert(n.into_string());
            }
        }
        Ok(iris.into_iter().map(NamedNode::new_unchecked).collect())
    }

    /// All triples of one member graph.
    pub fn triples(&self, graph: NamedNodeRef<'_>) -> Result<Vec<Triple>, StoreError> {
        self.store
            .quads_for_pattern(None, None, None, Some(graph.into()))
            .map(|quad| {
                let quad = quad?;
                Ok(Triple::new(quad.subject, quad.predicate, quad.object))
            })
            .collect()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.store.is_empty()?)
    }
}

impl Queryable for VirtualGraph {
    fn query(&self, query: &str) -> Result<QueryResults, StoreError> {
        Ok(self.store.query(query)?)
    }

    fn update(&self, update: &str, _versioning: bool) -> Result<(), StoreError> {
        self.store.update(update)?;
        Ok(())
    }
}

/// Read the quads stored under `internal` and re-emit them under
/// `public`: the rewrite projection used when Persistence keeps file
/// content in the provenance store under per-blob identifiers.
pub fn rewritten_quads(
    store: &Store,
    internal: NamedNodeRef<'_>,
    public: NamedNodeRef<'_>,
) -> Result<Vec<Quad>, StoreError> {
    store
        .quads_for_pattern(None, None, None, Some(internal.into()))
        .map(|quad| {
            let quad = quad?;
            Ok(Quad::new(
                quad.subject,
                quad.predicate,
                quad.object,
                public.into_owned(),
            ))
        })
        .collect()
}

fn contexts_of(store: &Store) -> Result<Vec<GraphName>, StoreError> {
    let mut named = BTreeSet::new();
    let mut has_default = false;
    for quad in store.quads_for_pattern(None, None, None, None) {
        let quad = quad?;
        match quad.graph_name {
            GraphName::NamedNode(n) => {
                named.insert(n.into_string());
            }
            GraphName::BlankNode(_) => {}
            GraphName::DefaultGraph => has_default = true,
        }
    }
    let mut contexts: Vec<GraphName> = named
        .into_iter()
        .map(|iri| GraphName::NamedNode(NamedNode::new_unchecked(iri)))
        .collect();
    if has_default {
        contexts.push(GraphName::DefaultGraph);
    }
    Ok(contexts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(s: &str, graph: &str) -> Quad {
        Quad::new(
            NamedNode::new(format!("http://example.org/{s}")).unwrap(),
            NamedNode::new("http://example.org/p").unwrap(),
            NamedNode::new("http://example.org/o").unwrap(),
            NamedNode::new(format!("http://example.org/{graph}")).unwrap(),
        )
    }

    #[test]
    fn test_memory_store_insert_and_ask() {
        let store = MemoryStore::new().unwrap();
        store.insert(quad("a", "g").as_ref()).unwrap();
        let result = store
            .query("ASK { GRAPH <http://example.org/g> { <http://example.org/a> ?p ?o } }")
            .unwrap();
        assert!(matches!(result, QueryResults::Boolean(true)));
        assert_eq!(store.len().unwrap(), 1);
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_memory_store_bulk_insert_remove_and_contexts() {
        let store = MemoryStore::new().unwrap();
        store
            .insert_quads(vec![quad("a", "g"), quad("b", "h")])
            .unwrap();
        let contexts = store.contexts().unwrap();
        assert_eq!(contexts.len(), 2);
        assert!(store.remove(quad("b", "h").as_ref()).unwrap());
        assert!(!store.remove(quad("b", "h").as_ref()).unwrap());
        assert_eq!(store.contexts().unwrap().len(), 1);
    }

    #[test]
    fn test_virtual_graph_aggregates_members() {
        let view = VirtualGraph::from_quads(vec![quad("a", "g"), quad("b", "h")]).unwrap();
        let contexts: Vec<String> = view
            .contexts()
            .unwrap()
            .into_iter()
            .map(NamedNode::into_string)
            .collect();
        assert_eq!(contexts, ["http://example.org/g", "http://example.org/h"]);

        let g = NamedNode::new("http://example.org/g").unwrap();
        assert_eq!(view.triples(g.as_ref()).unwrap().len(), 1);
    }

    #[test]
    fn test_virtual_graph_update_applies_to_copy() {
        let view = VirtualGraph::from_quads(vec![quad("a", "g")]).unwrap();
        view.update(
            "INSERT DATA { GRAPH <http://example.org/g> { <http://example.org/new> <http://example.org/p> <http://example.org/o> } }",
            true,
        )
        .unwrap();
        assert_eq!(view.len().unwrap(), 2);
    }

    #[test]
    fn test_rewrite_projection_translates_graph_slot() {
        let store = MemoryStore::new().unwrap();
        let internal = NamedNode::new("http://example.org/g-deadbeef").unwrap();
        let public = NamedNode::new("http://example.org/g").unwrap();
        store
            .insert(
                Quad::new(
                    NamedNode::new("http://example.org/a").unwrap(),
                    NamedNode::new("http://example.org/p").unwrap(),
                    NamedNode::new("http://example.org/o").unwrap(),
                    internal.clone(),
                )
                .as_ref(),
            )
            .unwrap();

        let projected = rewritten_quads(store.store(), internal.as_ref(), public.as_ref()).unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].graph_name.to_string(), "<http://example.org/g>");
    }
}
