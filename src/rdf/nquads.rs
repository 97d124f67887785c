//! Canonical N-Quads line handling.
//!
//! `encode_line` is the single place a triple becomes file bytes. Blob
//! editing removes lines by exact byte match, so the encoder must be
//! stable: the same triple and graph always yield the same bytes, and
//! the bytes re-parse to the same triple. The tests pin both directions.

use oxigraph::io::{RdfFormat, RdfParseError, RdfParser};
use oxigraph::model::{NamedNodeRef, Quad, Triple, TripleRef};

/// Drop the graph slot of a parsed quad.
pub fn quad_triple(quad: Quad) -> Triple {
    Triple::new(quad.subject, quad.predicate, quad.object)
}

/// Encode one triple as an N-Quads line in `graph`, newline included.
pub fn encode_line(triple: TripleRef<'_>, graph: NamedNodeRef<'_>) -> Vec<u8> {
    format!(
        "{} {} {} {} .\n",
        triple.subject, triple.predicate, triple.object, graph
    )
    .into_bytes()
}

/// Parse a whole N-Quads document into quads.
pub fn parse_quads(data: &[u8]) -> Result<Vec<Quad>, RdfParseError> {
    RdfParser::from_format(RdfFormat::NQuads)
        .for_reader(data)
        .collect()
}
