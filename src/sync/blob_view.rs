//! Parse-once view over one N-Quads blob.
//!
//! A `BlobView` keeps two representations of the same bytes: the exact
//! line sequence (for byte-preserving edits) and the parsed triples per
//! named graph (for instance views and the Persistence mirror). Only
//! graphs present in the configured map survive parsing; the graphs
//! declared for the file are always exposed, triples or not.
//!
//! Line edits keep both representations aligned: a canonical line added
//! or removed also updates the parsed context it belongs to. Lines that
//! do not parse are treated as opaque bytes and touch only the line
//! sequence.

use std::collections::BTreeMap;

use oxigraph::model::{GraphName, NamedNode, Triple};

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::rdf::nquads::parse_quads;

/// One N-Quads file at one blob version.
#[derive(Debug, Clone)]
pub struct BlobView {
    path: String,
    /// Exact bytes of each line, newline separators stripped.
    lines: Vec<Vec<u8>>,
    /// Graph IRI → parsed triples, ascending IRI order.
    contexts: BTreeMap<String, Vec<Triple>>,
    dirty: bool,
}

impl BlobView {
    /// Parse `data` once and keep only the graphs the configuration
    /// knows: {graphs declared for this file} ∪ {parsed graphs present
    /// in the map}. Everything else is discarded.
    pub fn parse(path: &str, data: &[u8], config: &StoreConfig) -> Result<Self, StoreError> {
        let quads = parse_quads(data).map_err(|e| StoreError::MalformedBlob {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let mut contexts: BTreeMap<String, Vec<Triple>> = BTreeMap::new();
        let basename = path.rsplit('/').next().unwrap_or(path);
        for declared in config.graph_uris_for_file(basename)? {
            contexts.entry(declared.into_string()).or_default();
        }
        for quad in quads {
            if let GraphName::NamedNode(graph) = &quad.graph_name {
                if config.tracks_graph(graph.as_str()) {
                    let key = graph.as_str().to_string();
                    contexts
                        .entry(key)
                        .or_default()
                        .push(Triple::new(quad.subject, quad.predicate, quad.object));
                }
            }
        }

        Ok(Self {
            path: path.to_string(),
            lines: split_lines(data),
            contexts,
            dirty: false,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Exposed graph identifiers, ascending.
    pub fn graphs(&self) -> Vec<NamedNode> {
        self.contexts
            .keys()
            .map(|iri| NamedNode::new_unchecked(iri.clone()))
            .collect()
    }

    /// Exposed graphs with their triples, ascending IRI order.
    pub fn graph_triples(&self) -> impl Iterator<Item = (&str, &[Triple])> {
        self.contexts
            .iter()
            .map(|(iri, triples)| (iri.as_str(), triples.as_slice()))
    }

    /// Current file bytes: every line re-joined with `\n`.
    pub fn content(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for line in &self.lines {
            bytes.extend_from_slice(line);
            bytes.push(b'\n');
        }
        bytes
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Unconditionally append `line` (trailing newline optional).
    pub fn add_line(&mut self, line: &[u8]) {
        let line = strip_newline(line);
        self.apply_line(line, true);
        self.lines.push(line.to_vec());
        self.dirty = true;
    }

    /// Remove the first line byte-identical to `line`. Removing an
    /// absent line is a no-op that returns `false`.
    pub fn remove_line(&mut self, line: &[u8]) -> bool {
        let line = strip_newline(line);
        match self.lines.iter().position(|l| l == line) {
            Some(index) => {
                self.lines.remove(index);
                self.apply_line(line, false);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mirror a line edit into the parsed contexts. Unparseable lines
    /// and untracked graphs leave the contexts untouched.
    fn apply_line(&mut self, line: &[u8], insert: bool) {
        let mut data = line.to_vec();
        data.push(b'\n');
        let Ok(quads) = parse_quads(&data) else {
            return;
        };
        for quad in quads {
            let GraphName::NamedNode(graph) = &quad.graph_name else {
                continue;
            };
            let Some(triples) = self.contexts.get_mut(graph.as_str()) else {
                continue;
            };
            let triple = Triple::new(quad.subject, quad.predicate, quad.object);
            if insert {
                triples.push(triple);
            } else if let Some(index) = triples.iter().position(|t| *t == triple) {
                triples.remove(index);
            }
        }
    }
}

fn strip_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}

fn split_lines(data: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = data.split(|b| *b == b'\n').map(|l| l.to_vec()).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Feature;
    use std::collections::BTreeMap as Map;

    fn config() -> StoreConfig {
        let mut map = Map::new();
        map.insert("http://example.org/g".to_string(), "graph.nq".to_string());
        map.insert("http://example.org/empty".to_string(), "graph.nq".to_string());
        StoreConfig::new(map, [Feature::Provenance])
    }

    const DATA: &[u8] = b"<http://example.org/a> <http://example.org/b> <http://example.org/c> <http://example.org/g> .\n\
                          <http://example.org/a> <http://example.org/b> <http://example.org/c> <http://example.org/untracked> .\n";

    #[test]
    fn test_untracked_graphs_are_discarded() {
        let view = BlobView::parse("graph.nq", DATA, &config()).unwrap();
        let graphs: Vec<String> = view.graphs().into_iter().map(NamedNode::into_string).collect();
        assert_eq!(graphs, ["http://example.org/empty", "http://example.org/g"]);
        let triples: Map<&str, usize> = view
            .graph_triples()
            .map(|(iri, triples)| (iri, triples.len()))
            .collect();
        assert_eq!(triples["http://example.org/g"], 1);
        assert_eq!(triples["http://example.org/empty"], 0);
    }

    #[test]
    fn test_content_preserves_bytes() {
        let view = BlobView::parse("graph.nq", DATA, &config()).unwrap();
        assert_eq!(view.content(), DATA.to_vec());
        assert!(!view.is_dirty());
    }

    #[test]
    fn test_add_and_remove_lines() {
        let mut view = BlobView::parse("graph.nq", DATA, &config()).unwrap();
        let line = b"<http://example.org/a> <http://example.org/b> <http://example.org/d> <http://example.org/g> .\n";
        view.add_line(line);
        assert!(view.is_dirty());
        assert_eq!(view.line_count(), 3);
        assert!(view.content().ends_with(line));
        // The parsed context follows the edit.
        let (_, triples) = view
            .graph_triples()
            .find(|(iri, _)| *iri == "http://example.org/g")
            .unwrap();
        assert_eq!(triples.len(), 2);

        assert!(view.remove_line(line));
        assert_eq!(view.line_count(), 2);
        let (_, triples) = view
            .graph_triples()
            .find(|(iri, _)| *iri == "http://example.org/g")
            .unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn test_remove_absent_line_is_noop() {
        let mut view = BlobView::parse("graph.nq", DATA, &config()).unwrap();
        assert!(!view.remove_line(b"<http://example.org/x> <http://example.org/y> <http://example.org/z> <http://example.org/g> .\n"));
        assert!(!view.is_dirty());
        assert_eq!(view.line_count(), 2);
    }

    #[test]
    fn test_malformed_blob_is_fatal() {
        let err = BlobView::parse("graph.nq", b"not quads at all\n", &config()).unwrap_err();
        assert!(matches!(err, StoreError::MalformedBlob { .. }));
    }

    #[test]
    fn test_declared_graphs_survive_empty_files() {
        let view = BlobView::parse("graph.nq", b"", &config()).unwrap();
        assert_eq!(view.graphs().len(), 2);
        assert_eq!(view.line_count(), 0);
        assert_eq!(view.content(), b"");
    }
}
