//! The Tree object represents a directory: an ordered list of entries,
//! each pairing a name with the id of a blob or sub-tree.
//!
//! Entries serialise as `{mode} {name}\0{20 raw id bytes}` and are sorted
//! the way Git sorts them (directory names compare as if suffixed with
//! `/`), so the same path→blob mapping always produces the same tree
//! bytes and therefore the same tree id.

use std::cmp::Ordering;
use std::fmt::Display;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::hash::ObjectId;
use crate::internal::object::ObjectTrait;
use crate::internal::object::types::ObjectType;

/// Entry mode, restricted to the two kinds the store produces.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeItemMode {
    Blob,
    Tree,
}

impl TreeItemMode {
    pub fn to_bytes(&self) -> &'static [u8] {
        match self {
            TreeItemMode::Blob => b"100644",
            TreeItemMode::Tree => b"40000",
        }
    }

    pub fn from_bytes(mode: &[u8]) -> Result<Self, StoreError> {
        match mode {
            b"100644" | b"100755" | b"120000" => Ok(TreeItemMode::Blob),
            b"40000" | b"040000" => Ok(TreeItemMode::Tree),
            _ => Err(StoreError::InvalidTreeObject(format!(
                "unknown entry mode `{}`",
                String::from_utf8_lossy(mode)
            ))),
        }
    }
}

/// One tree entry.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct TreeItem {
    pub mode: TreeItemMode,
    pub id: ObjectId,
    pub name: String,
}

impl TreeItem {
    pub fn new(mode: TreeItemMode, id: ObjectId, name: String) -> Self {
        Self { mode, id, name }
    }

    /// Git tree order: names compare byte-wise with directories extended
    /// by a trailing `/`.
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.name.as_bytes().to_vec();
        if self.mode == TreeItemMode::Tree {
            key.push(b'/');
        }
        key
    }
}

/// Directory object: sorted entries plus the content-address over them.
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub id: ObjectId,
    pub tree_items: Vec<TreeItem>,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for item in &self.tree_items {
            writeln!(
                f,
                "{} {} {}",
                String::from_utf8_lossy(item.mode.to_bytes()),
                item.id,
                item.name
            )?;
        }
        Ok(())
    }
}

impl Tree {
    /// Build a tree from entries, sorting them into canonical order.
    pub fn from_tree_items(mut tree_items: Vec<TreeItem>) -> Result<Tree, StoreError> {
        tree_items.sort_by(|a, b| match a.sort_key().cmp(&b.sort_key()) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });
        let mut tree = Tree {
            id: ObjectId::default(),
            tree_items,
        };
        tree.id = tree.compute_id()?;
        Ok(tree)
    }
}

impl ObjectTrait for Tree {
    fn from_bytes(data: &[u8], id: ObjectId) -> Result<Self, StoreError> {
        let mut tree_items = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            let space = rest
                .find_byte(b' ')
                .ok_or_else(|| StoreError::InvalidTreeObject("missing mode separator".into()))?;
            let mode = TreeItemMode::from_bytes(&rest[..space])?;
            rest = &rest[space + 1..];

            let nul = rest
                .find_byte(0x00)
                .ok_or_else(|| StoreError::InvalidTreeObject("missing name terminator".into()))?;
            let name = String::from_utf8(rest[..nul].to_vec())
                .map_err(|_| StoreError::InvalidTreeObject("entry name is not UTF-8".into()))?;
            rest = &rest[nul + 1..];

            if rest.len() < 20 {
                return Err(StoreError::InvalidTreeObject("truncated entry id".into()));
            }
            let item_id = ObjectId::from_raw_bytes(&rest[..20])?;
            rest = &rest[20..];

            tree_items.push(TreeItem::new(mode, item_id, name));
        }
        Ok(Tree { id, tree_items })
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn to_data(&self) -> Result<Vec<u8>, StoreError> {
        let mut data = Vec::new();
        for item in &self.tree_items {
            data.extend_from_slice(item.mode.to_bytes());
            data.push(b' ');
            data.extend_from_slice(item.name.as_bytes());
            data.push(0x00);
            data.extend_from_slice(item.id.as_ref());
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(mode: TreeItemMode, name: &str) -> TreeItem {
        TreeItem::new(
            mode,
            ObjectId::from_str("8ab686eafeb1f44702738c8b0f24f2567c36da6d").unwrap(),
            name.to_string(),
        )
    }

    #[test]
    fn test_round_trip() {
        let tree = Tree::from_tree_items(vec![
            item(TreeItemMode::Blob, "graph.nq"),
            item(TreeItemMode::Tree, "sub"),
        ])
        .unwrap();
        let data = tree.to_data().unwrap();
        let parsed = Tree::from_bytes(&data, tree.id).unwrap();
        assert_eq!(parsed.tree_items, tree.tree_items);
        assert_eq!(parsed.compute_id().unwrap(), tree.id);
    }

    #[test]
    fn test_directory_sort_order() {
        // Git orders `sub/` after `sub.nq` because the directory name
        // compares with a trailing slash.
        let tree = Tree::from_tree_items(vec![
            item(TreeItemMode::Tree, "sub"),
            item(TreeItemMode::Blob, "sub.nq"),
            item(TreeItemMode::Blob, "a.nq"),
        ])
        .unwrap();
        let names: Vec<&str> = tree.tree_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a.nq", "sub.nq", "sub"]);
    }

    #[test]
    fn test_same_entries_same_id() {
        let a = Tree::from_tree_items(vec![
            item(TreeItemMode::Blob, "b.nq"),
            item(TreeItemMode::Blob, "a.nq"),
        ])
        .unwrap();
        let b = Tree::from_tree_items(vec![
            item(TreeItemMode::Blob, "a.nq"),
            item(TreeItemMode::Blob, "b.nq"),
        ])
        .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_truncated_rejected() {
        let tree = Tree::from_tree_items(vec![item(TreeItemMode::Blob, "graph.nq")]).unwrap();
        let data = tree.to_data().unwrap();
        assert!(Tree::from_bytes(&data[..data.len() - 4], tree.id).is_err());
    }
}
