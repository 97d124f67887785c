//! Repository facade over the in-memory object database.
//!
//! Holds the ref table (branches and tags), resolves revisions, walks
//! trees, opens staging indexes and optionally materialises a working
//! directory on checkout. The synchronisation engine consumes exactly
//! this surface; remote transport (clone/fetch/push) is out of scope.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::hash::ObjectId;
use crate::internal::index::Index;
use crate::internal::object::commit::Commit;
use crate::internal::object::tree::TreeItemMode;
use crate::internal::odb::ObjectDb;

/// Name and e-mail used to sign synthesised commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

/// In-memory repository: object database, refs, default signature and an
/// optional working directory.
pub struct Repository {
    odb: ObjectDb,
    refs: DashMap<String, ObjectId>,
    identity: Identity,
    workdir: Option<PathBuf>,
}

impl Repository {
    /// A bare repository (no working directory).
    pub fn new(identity: Identity) -> Self {
        Self {
            odb: ObjectDb::new(),
            refs: DashMap::new(),
            identity,
            workdir: None,
        }
    }

    /// A repository whose checkout target is `workdir`.
    pub fn with_workdir(identity: Identity, workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
            ..Self::new(identity)
        }
    }

    pub fn odb(&self) -> &ObjectDb {
        &self.odb
    }

    pub fn default_signature(&self) -> &Identity {
        &self.identity
    }

    pub fn is_bare(&self) -> bool {
        self.workdir.is_none()
    }

    /// Point `name` at `id`, creating the ref if needed.
    pub fn set_ref(&self, name: &str, id: ObjectId) {
        self.refs.insert(name.to_string(), id);
    }

    pub fn reference(&self, name: &str) -> Option<ObjectId> {
        self.refs.get(name).map(|entry| *entry.value())
    }

    /// All branch and tag names, sorted for reproducible traversal.
    pub fn tags_or_branches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.refs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Resolve a ref name or a 40-character hex id to its commit.
    pub fn revision(&self, rev: &str) -> Result<Commit, StoreError> {
        if let Some(id) = self.reference(rev) {
            return self.commit_by_id(&id);
        }
        let id: ObjectId = rev
            .parse()
            .map_err(|_| StoreError::RevisionNotFound(rev.to_string()))?;
        self.commit_by_id(&id)
    }

    pub fn commit_by_id(&self, id: &ObjectId) -> Result<Commit, StoreError> {
        self.odb.get_commit(id)
    }

    /// Recursive file entries of a commit's tree as `(path, blob id)`,
    /// in ascending path order.
    pub fn entries(&self, commit: &Commit) -> Result<Vec<(String, ObjectId)>, StoreError> {
        let mut files = BTreeMap::new();
        let mut stack = vec![(String::new(), commit.tree_id)];
        while let Some((prefix, tree_id)) = stack.pop() {
            let tree = self.odb.get_tree(&tree_id)?;
            for item in tree.tree_items {
                let path = if prefix.is_empty() {
                    item.name.clone()
                } else {
                    format!("{prefix}/{}", item.name)
                };
                match item.mode {
                    TreeItemMode::Blob => {
                        files.insert(path, item.id);
                    }
                    TreeItemMode::Tree => stack.push((path, item.id)),
                }
            }
        }
        Ok(files.into_iter().collect())
    }

    pub fn blob_bytes(&self, id: &ObjectId) -> Result<Vec<u8>, StoreError> {
        Ok(self.odb.get_blob(id)?.data)
    }

    /// Open a staging area on top of `base_commit_id` (or an empty tree).
    pub fn index(&self, base_commit_id: Option<&ObjectId>) -> Result<Index<'_>, StoreError> {
        Index::new(self, base_commit_id)
    }

    /// First-parent history of a ref, newest first.
    pub fn log(&self, refname: &str) -> Result<Vec<Commit>, StoreError> {
        let mut commit = self.revision(refname)?;
        let mut history = vec![commit.clone()];
        while let Some(parent) = commit.parent_commit_ids.first() {
            commit = self.commit_by_id(parent)?;
            history.push(commit.clone());
        }
        Ok(history)
    }

    /// Overwrite the working directory with the tree at `refname`.
    pub fn checkout_force(&self, refname: &str) -> Result<(), StoreError> {
        let Some(workdir) = self.workdir.as_deref() else {
            return Err(StoreError::InvariantViolation(
                "checkout requested on a bare repository".to_string(),
            ));
        };
        let commit = self.revision(refname)?;
        for (path, blob_id) in self.entries(&commit)? {
            let target = workdir.join(&path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, self.blob_bytes(&blob_id)?)?;
        }
        tracing::debug!(refname, workdir = %workdir.display(), "checked out tree");
        Ok(())
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("Quad Store", "store@example.org")
    }

    fn commit_file(repo: &Repository, base: Option<&ObjectId>, path: &str, data: &[u8]) -> ObjectId {
        let mut index = repo.index(base).unwrap();
        index.add(path, data).unwrap();
        index
            .commit("test commit", "Quad Store", "store@example.org", "refs/heads/main")
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_revision_by_ref_and_hex() {
        let repo = Repository::new(identity());
        let id = commit_file(&repo, None, "graph.nq", b"");
        assert_eq!(repo.revision("refs/heads/main").unwrap().id, id);
        assert_eq!(repo.revision(&id.to_string()).unwrap().id, id);
        assert!(repo.revision("refs/heads/missing").is_err());
    }

    #[test]
    fn test_tags_or_branches_sorted() {
        let repo = Repository::new(identity());
        let id = commit_file(&repo, None, "graph.nq", b"");
        repo.set_ref("refs/tags/v1", id);
        assert_eq!(
            repo.tags_or_branches(),
            vec!["refs/heads/main".to_string(), "refs/tags/v1".to_string()]
        );
    }

    #[test]
    fn test_log_is_first_parent_newest_first() {
        let repo = Repository::new(identity());
        let first = commit_file(&repo, None, "graph.nq", b"a");
        let second = commit_file(&repo, Some(&first), "graph.nq", b"b");
        let log = repo.log("refs/heads/main").unwrap();
        let ids: Vec<ObjectId> = log.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_checkout_writes_workdir() {
        let dir = std::env::temp_dir().join(format!("quadrepo-checkout-{}", std::process::id()));
        let repo = Repository::with_workdir(identity(), &dir);
        assert!(!repo.is_bare());
        commit_file(&repo, None, "graph.nq", b"<a> <b> <c> <http://example.org/g> .\n");
        repo.checkout_force("refs/heads/main").unwrap();
        let written = std::fs::read(repo.workdir().unwrap().join("graph.nq")).unwrap();
        assert_eq!(written, b"<a> <b> <c> <http://example.org/g> .\n");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_checkout_on_bare_repo_is_an_error() {
        let repo = Repository::new(identity());
        commit_file(&repo, None, "graph.nq", b"");
        assert!(matches!(
            repo.checkout_force("refs/heads/main"),
            Err(StoreError::InvariantViolation(_))
        ));
    }
}
