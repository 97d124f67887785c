//! The Commit object represents one version of the dataset: the tree
//! holding the N-Quads files, the parent commits, the author and
//! committer signatures, and the message.
//!
//! Messages may open with structured headers of the form `Key: value`
//! (or `Key: "multi-line value"` when the value embeds newlines),
//! followed by a blank line and free-form text. The synchroniser reads
//! the `Source` and `Query` headers from there.

use std::collections::BTreeMap;
use std::fmt::Display;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::hash::ObjectId;
use crate::internal::object::ObjectTrait;
use crate::internal::object::signature::Signature;
use crate::internal::object::types::ObjectType;

/// One dataset version in the commit DAG.
///
/// - `tree_id` points at the top-level tree, the complete set of N-Quads
///   files at this version.
/// - `parent_commit_ids` are ordered; the first parent is the one the
///   synchroniser diffs against.
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: ObjectId,
    pub tree_id: ObjectId,
    pub parent_commit_ids: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "tree: {}", self.tree_id)?;
        for parent in self.parent_commit_ids.iter() {
            writeln!(f, "parent: {parent}")?;
        }
        writeln!(f, "{}", self.author)?;
        writeln!(f, "{}", self.committer)?;
        writeln!(f, "{}", self.message)
    }
}

impl Commit {
    pub fn new(
        author: Signature,
        committer: Signature,
        tree_id: ObjectId,
        parent_commit_ids: Vec<ObjectId>,
        message: &str,
    ) -> Result<Commit, StoreError> {
        let mut commit = Commit {
            id: ObjectId::default(),
            tree_id,
            parent_commit_ids,
            author,
            committer,
            message: message.to_string(),
        };
        commit.id = commit.compute_id()?;
        Ok(commit)
    }

    /// Structured headers embedded at the top of the message.
    ///
    /// Consecutive leading `Key: value` lines are collected until the
    /// first blank or non-header line. A value opening with `"` spans
    /// lines until the closing quote. Messages that do not start with a
    /// header line have no headers.
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        let mut lines = self.message.lines();
        while let Some(line) = lines.next() {
            let Some((key, value)) = split_header(line) else {
                break;
            };
            if let Some(open) = value.strip_prefix('"') {
                if !open.is_empty() && open.ends_with('"') {
                    headers.insert(key.to_string(), open[..open.len() - 1].to_string());
                    continue;
                }
                let mut parts = vec![open.to_string()];
                for cont in lines.by_ref() {
                    if let Some(end) = cont.strip_suffix('"') {
                        parts.push(end.to_string());
                        break;
                    }
                    parts.push(cont.to_string());
                }
                headers.insert(key.to_string(), parts.join("\n"));
            } else {
                headers.insert(key.to_string(), value.to_string());
            }
        }
        headers
    }
}

/// Split a `Key: value` header line; keys are single words of
/// alphanumerics, `-` and `_`.
fn split_header(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(": ")?;
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((key, value))
}

impl ObjectTrait for Commit {
    fn from_bytes(data: &[u8], id: ObjectId) -> Result<Self, StoreError> {
        let invalid = |what: &str| StoreError::InvalidCommitObject(what.to_string());

        // Tree line: `tree <hex>`.
        let tree_end = data.find_byte(0x0a).ok_or_else(|| invalid("missing tree line"))?;
        let tree_line = &data[..tree_end];
        let tree_hex = tree_line
            .strip_prefix(b"tree ")
            .ok_or_else(|| invalid("missing tree header"))?;
        let tree_id: ObjectId = std::str::from_utf8(tree_hex)
            .map_err(|_| invalid("tree id is not UTF-8"))?
            .parse()?;
        let mut rest = &data[tree_end + 1..];

        // Zero or more `parent <hex>` lines.
        let mut parent_commit_ids = Vec::new();
        while let Some(hex) = rest
            .split_once_str(b"\n")
            .and_then(|(line, _)| line.strip_prefix(b"parent "))
        {
            let parent: ObjectId = std::str::from_utf8(hex)
                .map_err(|_| invalid("parent id is not UTF-8"))?
                .parse()?;
            parent_commit_ids.push(parent);
            rest = &rest[rest.find_byte(0x0a).map(|i| i + 1).unwrap_or(rest.len())..];
        }

        // Author and committer lines.
        let author_end = rest.find_byte(0x0a).ok_or_else(|| invalid("missing author line"))?;
        let author = Signature::from_data(&rest[..author_end])?;
        rest = &rest[author_end + 1..];

        let committer_end = rest
            .find_byte(0x0a)
            .ok_or_else(|| invalid("missing committer line"))?;
        let committer = Signature::from_data(&rest[..committer_end])?;
        rest = &rest[committer_end + 1..];

        // A blank line separates the headers from the message.
        let message_bytes = rest.strip_prefix(b"\n").unwrap_or(rest);
        let message = String::from_utf8(message_bytes.to_vec())
            .map_err(|_| invalid("message is not UTF-8"))?;

        Ok(Commit {
            id,
            tree_id,
            parent_commit_ids,
            author,
            committer,
            message,
        })
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn to_data(&self) -> Result<Vec<u8>, StoreError> {
        let mut data = Vec::new();

        data.extend(b"tree ");
        data.extend(self.tree_id.to_string().as_bytes());
        data.push(0x0a);

        for parent in &self.parent_commit_ids {
            data.extend(b"parent ");
            data.extend(parent.to_string().as_bytes());
            data.push(0x0a);
        }

        data.extend(self.author.to_data()?);
        data.push(0x0a);
        data.extend(self.committer.to_data()?);
        data.push(0x0a);
        data.push(0x0a);
        data.extend(self.message.as_bytes());

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::object::signature::SignatureKind;
    use std::str::FromStr;

    fn signature(kind: SignatureKind) -> Signature {
        Signature::new(kind, "Jane Doe", "jane@example.org", 1717171717, "+0200")
    }

    fn basic_commit(message: &str) -> Commit {
        Commit::new(
            signature(SignatureKind::Author),
            signature(SignatureKind::Committer),
            ObjectId::from_str("341e54913a3a43069f2927cc0f703e5a9f730df1").unwrap(),
            vec![ObjectId::from_str("57d7685c60213a9da465cf900f31933be3a7ee39").unwrap()],
            message,
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let commit = basic_commit("store initial dataset\n");
        let data = commit.to_data().unwrap();
        let parsed = Commit::from_bytes(&data, commit.id).unwrap();
        assert_eq!(parsed.tree_id, commit.tree_id);
        assert_eq!(parsed.parent_commit_ids, commit.parent_commit_ids);
        assert_eq!(parsed.author, commit.author);
        assert_eq!(parsed.committer, commit.committer);
        assert_eq!(parsed.message, commit.message);
        assert_eq!(parsed.compute_id().unwrap(), commit.id);
    }

    #[test]
    fn test_parentless_commit() {
        let commit = Commit::new(
            signature(SignatureKind::Author),
            signature(SignatureKind::Committer),
            ObjectId::from_str("341e54913a3a43069f2927cc0f703e5a9f730df1").unwrap(),
            vec![],
            "initial",
        )
        .unwrap();
        let parsed = Commit::from_bytes(&commit.to_data().unwrap(), commit.id).unwrap();
        assert!(parsed.parent_commit_ids.is_empty());
        assert_eq!(parsed.message, "initial");
    }

    #[test]
    fn test_headers_simple() {
        let commit = basic_commit("Source: http://example.org/dump.nq\n\nimported dataset");
        let headers = commit.headers();
        assert_eq!(
            headers.get("Source").map(String::as_str),
            Some("http://example.org/dump.nq")
        );
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_quoted_multi_line() {
        let commit = basic_commit(
            "Query: \"INSERT DATA {\n  GRAPH <http://example.org/g> { <a> <b> <c> }\n}\"\n\napplied update",
        );
        let headers = commit.headers();
        assert_eq!(
            headers.get("Query").map(String::as_str),
            Some("INSERT DATA {\n  GRAPH <http://example.org/g> { <a> <b> <c> }\n}")
        );
    }

    #[test]
    fn test_plain_message_has_no_headers() {
        let commit = basic_commit("merge branch develop\n\nnothing structured here");
        assert!(commit.headers().is_empty());
        // A colon inside an ordinary sentence is not a header.
        let commit = basic_commit("fix bug: off by one");
        assert!(commit.headers().is_empty());
    }
}
