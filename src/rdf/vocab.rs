//! Vocabulary constants and IRI minting for the provenance graph.
//!
//! PROV-O, FOAF and RDFS terms are exposed as `NamedNodeRef` constants;
//! the store's own namespace mints per-commit, per-agent and per-blob
//! identifiers. The `preceeding` spelling is part of the published
//! vocabulary and must not be corrected.

use std::fmt::Display;

use oxigraph::model::{NamedNode, NamedNodeRef};

/// [PROV-O](https://www.w3.org/ns/prov#) terms used by the hydrator.
pub mod prov {
    use oxigraph::model::NamedNodeRef;

    pub const ACTIVITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#Activity");
    pub const AGENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#Agent");
    pub const ENTITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#Entity");
    pub const ROLE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#Role");
    pub const ASSOCIATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#Association");
    pub const WAS_ASSOCIATED_WITH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#wasAssociatedWith");
    pub const QUALIFIED_ASSOCIATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#qualifiedAssociation");
    pub const AGENT_PROP: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#agent");
    pub const ROLE_PROP: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#role");
    pub const STARTED_AT_TIME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#startedAtTime");
    pub const ENDED_AT_TIME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#endedAtTime");
    pub const SPECIALIZATION_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#specializationOf");
    pub const WAS_GENERATED_BY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#wasGeneratedBy");
}

/// [FOAF](http://xmlns.com/foaf/0.1/) terms.
pub mod foaf {
    use oxigraph::model::NamedNodeRef;

    pub const MBOX: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://xmlns.com/foaf/0.1/mbox");
}

/// [RDFS](http://www.w3.org/2000/01/rdf-schema#) terms.
pub mod rdfs {
    use oxigraph::model::NamedNodeRef;

    pub const LABEL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label");
    pub const COMMENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#comment");
}

/// The store's own namespace.
pub const QUIT_NS: &str = "http://quit.aksw.org/vocab/";

pub const IMPORT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/Import");
pub const TRANSFORMATION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/Transformation");
pub const ROLE_AUTHOR: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/Author");
pub const ROLE_COMMITTER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/Committer");
pub const DATA_SOURCE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/dataSource");
pub const QUERY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/query");
pub const HEX: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/hex");
pub const UPDATES: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/updates");
pub const GRAPH: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/graph");
/// Historical spelling, kept for wire compatibility.
pub const PRECEEDING_COMMIT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://quit.aksw.org/vocab/preceedingCommit");

/// `quit:commit-{id}`: the Activity for a commit.
pub fn commit_uri(id: impl Display) -> NamedNode {
    NamedNode::new_unchecked(format!("{QUIT_NS}commit-{id}"))
}

/// `quit:user-{hex}`: an Agent derived from the content hash of an
/// e-mail address.
pub fn user_uri(email_hash: impl Display) -> NamedNode {
    NamedNode::new_unchecked(format!("{QUIT_NS}user-{email_hash}"))
}

/// `quit:update-{commit}-{index}`: one per changed graph in a commit.
pub fn update_uri(commit_id: impl Display, index: usize) -> NamedNode {
    NamedNode::new_unchecked(format!("{QUIT_NS}update-{commit_id}-{index}"))
}

/// `quit:{op}-{commit}`: the context holding an operation's triples.
pub fn op_uri(op: &str, commit_id: impl Display) -> NamedNode {
    NamedNode::new_unchecked(format!("{QUIT_NS}{op}-{commit_id}"))
}

/// `quit:additions` / `quit:removals`: the predicate linking an update
/// to an operation context.
pub fn op_predicate(op: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{QUIT_NS}{op}"))
}

/// `quit:graph-{blob}-{index}`: the private per-blob graph entity.
pub fn private_graph_uri(blob_id: impl Display, index: usize) -> NamedNode {
    NamedNode::new_unchecked(format!("{QUIT_NS}graph-{blob_id}-{index}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_iris() {
        assert_eq!(
            commit_uri("abc123").as_str(),
            "http://quit.aksw.org/vocab/commit-abc123"
        );
        assert_eq!(
            update_uri("abc123", 0).as_str(),
            "http://quit.aksw.org/vocab/update-abc123-0"
        );
        assert_eq!(
            op_uri("additions", "abc123").as_str(),
            "http://quit.aksw.org/vocab/additions-abc123"
        );
        assert_eq!(
            private_graph_uri("deadbeef", 2).as_str(),
            "http://quit.aksw.org/vocab/graph-deadbeef-2"
        );
    }
}
