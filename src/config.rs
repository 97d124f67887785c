//! Store configuration: which named graph lives in which N-Quads file,
//! and which optional behaviours are switched on.
//!
//! Loading from disk is the embedder's concern; the types deserialize
//! with `serde` so any front-end format works.

use std::collections::{BTreeMap, BTreeSet};

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Optional behaviours of the synchronisation engine.
///
/// * `Provenance`: emit PROV/QUIT metadata for every commit.
/// * `Persistence`: mirror file content into the in-memory store under
///   per-blob graph identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Provenance,
    Persistence,
}

/// Graph-to-file mapping plus feature flags.
///
/// A graph IRI is served by at most one file; a file may serve several
/// graphs. Graphs parsed from a blob that are absent from this map are
/// discarded.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StoreConfig {
    /// Graph IRI → repository-relative file name.
    graph_files: BTreeMap<String, String>,
    #[serde(default)]
    features: BTreeSet<Feature>,
}

impl StoreConfig {
    pub fn new(
        graph_files: BTreeMap<String, String>,
        features: impl IntoIterator<Item = Feature>,
    ) -> Self {
        Self {
            graph_files,
            features: features.into_iter().collect(),
        }
    }

    /// The full graph IRI → file name mapping.
    pub fn graph_uri_file_map(&self) -> &BTreeMap<String, String> {
        &self.graph_files
    }

    /// Whether `file` (a tree-entry basename) serves any configured graph.
    pub fn tracks_file(&self, file: &str) -> bool {
        self.graph_files.values().any(|f| f == file)
    }

    /// Whether `iri` is a configured graph identifier.
    pub fn tracks_graph(&self, iri: &str) -> bool {
        self.graph_files.contains_key(iri)
    }

    /// All graph IRIs declared for `file`, in ascending IRI order.
    pub fn graph_uris_for_file(&self, file: &str) -> Result<Vec<NamedNode>, StoreError> {
        self.graph_files
            .iter()
            .filter(|(_, f)| f.as_str() == file)
            .map(|(iri, _)| {
                NamedNode::new(iri.clone()).map_err(|_| StoreError::InvalidGraphIri(iri.clone()))
            })
            .collect()
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoreConfig {
        let mut map = BTreeMap::new();
        map.insert("http://example.org/graph".to_string(), "graph.nq".to_string());
        map.insert("http://example.org/extra".to_string(), "graph.nq".to_string());
        map.insert("http://example.org/other".to_string(), "other.nq".to_string());
        StoreConfig::new(map, [Feature::Provenance])
    }

    #[test]
    fn test_file_and_graph_lookup() {
        let config = sample();
        assert!(config.tracks_file("graph.nq"));
        assert!(config.tracks_file("other.nq"));
        assert!(!config.tracks_file("unrelated.nq"));
        assert!(config.tracks_graph("http://example.org/graph"));
        assert!(!config.tracks_graph("http://example.org/unknown"));

        let graphs = config.graph_uris_for_file("graph.nq").unwrap();
        let names: Vec<&str> = graphs.iter().map(|g| g.as_str()).collect();
        assert_eq!(names, ["http://example.org/extra", "http://example.org/graph"]);
    }

    #[test]
    fn test_features() {
        let config = sample();
        assert!(config.has_feature(Feature::Provenance));
        assert!(!config.has_feature(Feature::Persistence));
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{
            "graph_files": { "http://example.org/graph": "graph.nq" },
            "features": ["provenance", "persistence"]
        }"#;
        let config: StoreConfig = serde_json::from_str(json).unwrap();
        assert!(config.has_feature(Feature::Persistence));
        assert_eq!(config.graph_uri_file_map().len(), 1);
    }
}
