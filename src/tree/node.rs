//! Filesystem node types
//!
//! Leaves are files, directory symlinks and unreadable entries. Directories
//! own their children in a name-ordered map and carry a fingerprint computed
//! from them when the directory is constructed; nodes are never mutated after.

use crate::error::ScanError;
use crate::tree::{hasher, path};
use crate::types::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a file was excluded from content fingerprinting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Larger than the configured size ceiling
    TooLarge,
    /// Sample prefix contained NUL bytes or invalid UTF-8
    Binary,
}

/// File node representation
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub path: String,
    pub fingerprint: Fingerprint,
    pub size: u64,
    /// Set when `fingerprint` is derived from size only
    pub skip_reason: Option<SkipReason>,
}

impl FileNode {
    pub fn skipped(&self) -> bool {
        self.skip_reason.is_some()
    }
}

/// Directory symlink, recorded without being traversed
#[derive(Debug, Clone, PartialEq)]
pub struct LinkNode {
    pub path: String,
    pub target: String,
    pub fingerprint: Fingerprint,
}

impl LinkNode {
    pub fn new(path: String, target: String) -> Self {
        let fingerprint = hasher::link_fingerprint(&target);
        Self {
            path,
            target,
            fingerprint,
        }
    }
}

/// Entry that could not be read; contributes the sentinel fingerprint
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableNode {
    pub path: String,
    pub fingerprint: Fingerprint,
}

impl UnreadableNode {
    pub fn new(path: String) -> Self {
        Self {
            path,
            fingerprint: hasher::unreadable_fingerprint(),
        }
    }
}

/// Directory node representation
#[derive(Debug, Clone, PartialEq)]
pub struct DirNode {
    pub path: String,
    /// Children keyed by entry name, iterated in lexicographic order
    pub children: BTreeMap<String, Node>,
    pub fingerprint: Fingerprint,
}

/// Merkle node type
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    File(FileNode),
    Directory(DirNode),
    Link(LinkNode),
    Unreadable(UnreadableNode),
}

impl Node {
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Node::File(f) => f.fingerprint,
            Node::Directory(d) => d.fingerprint,
            Node::Link(l) => l.fingerprint,
            Node::Unreadable(u) => u.fingerprint,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::File(f) => &f.path,
            Node::Directory(d) => &d.path,
            Node::Link(l) => &l.path,
            Node::Unreadable(u) => &u.path,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

impl DirNode {
    /// Build a directory from its finished children and compute its fingerprint.
    pub fn from_children(path: String, children: BTreeMap<String, Node>) -> Self {
        let fingerprint = hasher::directory_fingerprint(
            children
                .iter()
                .map(|(name, child)| (name.as_str(), child.fingerprint())),
        );
        Self {
            path,
            children,
            fingerprint,
        }
    }

    /// An empty root directory.
    pub fn empty_root() -> Self {
        Self::from_children(String::new(), BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// All leaves in path order (depth-first, children by name).
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// Number of leaves below this directory.
    pub fn leaf_count(&self) -> usize {
        self.children
            .values()
            .map(|child| match child {
                Node::Directory(d) => d.leaf_count(),
                _ => 1,
            })
            .sum()
    }

    /// Look up a node by root-relative path.
    pub fn find(&self, relative: &str) -> Option<&Node> {
        let mut parts = path::segments(relative).peekable();
        let mut current = self;
        while let Some(part) = parts.next() {
            let child = current.children.get(part)?;
            if parts.peek().is_none() {
                return Some(child);
            }
            match child {
                Node::Directory(d) => current = d,
                _ => return None,
            }
        }
        None
    }

    /// Reassemble a directory hierarchy from leaves keyed by relative path.
    ///
    /// Intermediate directories are implied by the paths. Fails if a path is
    /// both a leaf and the parent of another leaf, or appears twice.
    pub fn assemble<I>(leaves: I) -> Result<DirNode, ScanError>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut root = PendingDir::default();
        for leaf in leaves {
            if leaf.is_directory() {
                return Err(ScanError::ManifestCorrupt(format!(
                    "directory node {:?} cannot be assembled as a leaf",
                    leaf.path()
                )));
            }
            let leaf_path = leaf.path().to_string();
            let parts: Vec<&str> = path::segments(&leaf_path).collect();
            let Some((name, parents)) = parts.split_last() else {
                return Err(ScanError::ManifestCorrupt("entry with empty path".to_string()));
            };
            let mut current = &mut root;
            for part in parents {
                let slot = current
                    .children
                    .entry((*part).to_string())
                    .or_insert_with(|| Pending::Dir(PendingDir::default()));
                current = match slot {
                    Pending::Dir(dir) => dir,
                    Pending::Leaf(_) => {
                        return Err(ScanError::ManifestCorrupt(format!(
                            "path {:?} is nested under a non-directory entry",
                            leaf_path
                        )))
                    }
                };
            }
            if current
                .children
                .insert((*name).to_string(), Pending::Leaf(leaf))
                .is_some()
            {
                return Err(ScanError::ManifestCorrupt(format!(
                    "path {:?} appears more than once",
                    leaf_path
                )));
            }
        }
        Ok(root.finish(String::new()))
    }
}

fn collect_leaves<'a>(dir: &'a DirNode, out: &mut Vec<&'a Node>) {
    for child in dir.children.values() {
        match child {
            Node::Directory(d) => collect_leaves(d, out),
            leaf => out.push(leaf),
        }
    }
}

#[derive(Default)]
struct PendingDir {
    children: BTreeMap<String, Pending>,
}

enum Pending {
    Leaf(Node),
    Dir(PendingDir),
}

impl PendingDir {
    fn finish(self, dir_path: String) -> DirNode {
        let children = self
            .children
            .into_iter()
            .map(|(name, pending)| {
                let node = match pending {
                    Pending::Leaf(leaf) => leaf,
                    Pending::Dir(dir) => {
                        let child_path = path::join(&dir_path, &name);
                        Node::Directory(dir.finish(child_path))
                    }
                };
                (name, node)
            })
            .collect();
        DirNode::from_children(dir_path, children)
    }
}
