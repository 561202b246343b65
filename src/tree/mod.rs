//! Filesystem Merkle Tree
//!
//! Represents a directory as a Merkle tree: every file, directory link and
//! unreadable entry is a leaf with a fingerprint, and every directory's
//! fingerprint is derived from its children's names and fingerprints.

pub mod builder;
pub mod cache;
pub mod fingerprint;
pub mod hasher;
pub mod node;
pub mod path;

pub use builder::{build_tree, ScanStats, ScanTree, TreeBuilder};
pub use node::{DirNode, FileNode, LinkNode, Node, SkipReason, UnreadableNode};
