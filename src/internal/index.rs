//! Staging area bound to a base commit.
//!
//! An `Index` snapshots the file entries of a base tree. `add` stages new
//! content for a path and records the staged blob id in the public
//! `stash`, where the commit synthesiser reads back the post-stage id.
//! `commit` merges staged entries over the snapshot, writes the tree and
//! the commit, and advances the target ref. Committing with an empty
//! stash stages nothing and returns `None`.

use std::collections::{BTreeMap, HashMap};

use crate::errors::StoreError;
use crate::hash::ObjectId;
use crate::internal::object::blob::Blob;
use crate::internal::object::commit::Commit;
use crate::internal::object::signature::{Signature, SignatureKind};
use crate::internal::object::tree::{Tree, TreeItem, TreeItemMode};
use crate::internal::odb::ObjectDb;
use crate::repository::Repository;

/// Staging area over a base commit's tree.
pub struct Index<'a> {
    repo: &'a Repository,
    base_commit: Option<Commit>,
    /// File path → blob id, snapshot of the base tree.
    entries: BTreeMap<String, ObjectId>,
    /// Path → (staged blob id, staged bytes), in staging order.
    pub stash: HashMap<String, (ObjectId, Vec<u8>)>,
}

impl<'a> Index<'a> {
    pub(crate) fn new(
        repo: &'a Repository,
        base_commit_id: Option<&ObjectId>,
    ) -> Result<Self, StoreError> {
        let (base_commit, entries) = match base_commit_id {
            Some(id) => {
                let commit = repo.commit_by_id(id)?;
                let entries = repo.entries(&commit)?.into_iter().collect();
                (Some(commit), entries)
            }
            None => (None, BTreeMap::new()),
        };
        Ok(Self {
            repo,
            base_commit,
            entries,
            stash: HashMap::new(),
        })
    }

    /// Stage `content` for `path`, replacing any base entry on commit.
    pub fn add(&mut self, path: &str, content: &[u8]) -> Result<ObjectId, StoreError> {
        let blob = Blob::new(content);
        let id = self.repo.odb().put(&blob)?;
        self.stash.insert(path.to_string(), (id, content.to_vec()));
        Ok(id)
    }

    /// Blob id of the last content staged for `path`.
    pub fn staged_id(&self, path: &str) -> Option<ObjectId> {
        self.stash.get(path).map(|(id, _)| *id)
    }

    /// Write the merged tree and a commit on top of the base commit, then
    /// advance `refname`. Returns `None` when nothing is staged.
    pub fn commit(
        &mut self,
        message: &str,
        name: &str,
        email: &str,
        refname: &str,
    ) -> Result<Option<ObjectId>, StoreError> {
        if self.stash.is_empty() {
            tracing::debug!("commit requested with an empty stash; nothing staged");
            return Ok(None);
        }

        let mut files = self.entries.clone();
        for (path, (id, _)) in &self.stash {
            files.insert(path.clone(), *id);
        }
        let tree_id = write_tree(self.repo.odb(), &files)?;

        let parents = self
            .base_commit
            .as_ref()
            .map(|c| vec![c.id])
            .unwrap_or_default();
        let author = Signature::now(SignatureKind::Author, name, email);
        let committer = Signature::now(SignatureKind::Committer, name, email);
        let commit = Commit::new(author, committer, tree_id, parents, message)?;
        let id = self.repo.odb().put(&commit)?;
        self.repo.set_ref(refname, id);
        tracing::debug!(%id, refname, "staged {} file(s) into new commit", self.stash.len());
        Ok(Some(id))
    }
}

/// Recursively write the tree objects for a path → blob mapping.
fn write_tree(
    odb: &ObjectDb,
    files: &BTreeMap<String, ObjectId>,
) -> Result<ObjectId, StoreError> {
    let mut items = Vec::new();
    let mut subdirs: BTreeMap<String, BTreeMap<String, ObjectId>> = BTreeMap::new();
    for (path, id) in files {
        match path.split_once('/') {
            None => items.push(TreeItem::new(TreeItemMode::Blob, *id, path.clone())),
            Some((dir, rest)) => {
                subdirs
                    .entry(dir.to_string())
                    .or_default()
                    .insert(rest.to_string(), *id);
            }
        }
    }
    for (name, sub) in &subdirs {
        let sub_id = write_tree(odb, sub)?;
        items.push(TreeItem::new(TreeItemMode::Tree, sub_id, name.clone()));
    }
    let tree = Tree::from_tree_items(items)?;
    odb.put(&tree)
}
