//! Human- and machine-readable views of a scanned tree
//!
//! `render_tree` draws the hierarchy with box-drawing connectors, directories
//! before files. `render_compact` lists one leaf per line. `summarize` builds a
//! nested structure of names and fingerprints for lightweight storage.

use crate::tree::node::{DirNode, Node, SkipReason};
use crate::types::Fingerprint;
use serde::Serialize;
use std::fmt::Write;

/// Options for [`render_tree`]
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub show_fingerprints: bool,
    /// Label printed for the root line
    pub root_name: String,
}

/// Draw the tree.
pub fn render_tree(root: &DirNode, options: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}/", options.root_name);
    if options.show_fingerprints {
        let _ = write!(out, " [{}]", root.fingerprint.short());
    }
    out.push('\n');
    let _ = writeln!(out, "Total: {} entries", root.leaf_count());
    out.push('\n');
    draw_children(root, "", options, &mut out);
    out
}

fn draw_children(dir: &DirNode, prefix: &str, options: &RenderOptions, out: &mut String) {
    let mut children: Vec<(&String, &Node)> = dir.children.iter().collect();
    // Directories first, then case-insensitive name
    children.sort_by(|a, b| {
        (!a.1.is_directory(), a.0.to_lowercase(), a.0)
            .cmp(&(!b.1.is_directory(), b.0.to_lowercase(), b.0))
    });

    let count = children.len();
    for (i, (name, node)) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        let _ = write!(out, "{}{}{}", prefix, connector, label(name, node));
        if options.show_fingerprints {
            let _ = write!(out, " [{}]", node.fingerprint().short());
        }
        out.push('\n');

        if let Node::Directory(child) = node {
            let extension = if last { "    " } else { "│   " };
            draw_children(child, &format!("{}{}", prefix, extension), options, out);
        }
    }
}

fn label(name: &str, node: &Node) -> String {
    match node {
        Node::Directory(_) => format!("{}/", name),
        Node::File(f) => match f.skip_reason {
            Some(SkipReason::TooLarge) => format!("{} (skipped: too large)", name),
            Some(SkipReason::Binary) => format!("{} (skipped: binary)", name),
            None => name.to_string(),
        },
        Node::Link(l) => format!("{} -> {}", name, l.target),
        Node::Unreadable(_) => format!("{} (unreadable)", name),
    }
}

/// One line per leaf: size, short fingerprint, path.
pub fn render_compact(root: &DirNode, root_label: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", root_label);
    let _ = writeln!(out, "# Total: {} entries", root.leaf_count());
    let _ = writeln!(out, "# Merkle root: {}", root.fingerprint);
    out.push('\n');
    for leaf in root.leaves() {
        let size = match leaf {
            Node::File(f) => f.size,
            _ => 0,
        };
        let marker = match leaf {
            Node::File(f) if f.skipped() => " [skipped]",
            Node::Link(_) => " [link]",
            Node::Unreadable(_) => " [unreadable]",
            _ => "",
        };
        let _ = writeln!(
            out,
            "{:>10} [{}] {}{}",
            size,
            leaf.fingerprint().short(),
            leaf.path(),
            marker
        );
    }
    out
}

/// Kind tag used in [`TreeSummary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    Directory,
    File,
    Link,
    Unreadable,
}

/// Nested hierarchy with fingerprints only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    pub name: String,
    pub kind: SummaryKind,
    pub fingerprint: Fingerprint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSummary>,
}

/// Summarize the tree rooted at `root`, labelling the root `root_name`.
pub fn summarize(root: &DirNode, root_name: &str) -> TreeSummary {
    summarize_dir(root, root_name.to_string())
}

fn summarize_dir(dir: &DirNode, name: String) -> TreeSummary {
    TreeSummary {
        name,
        kind: SummaryKind::Directory,
        fingerprint: dir.fingerprint,
        children: dir
            .children
            .iter()
            .map(|(child_name, node)| summarize_node(child_name, node))
            .collect(),
    }
}

fn summarize_node(name: &str, node: &Node) -> TreeSummary {
    let kind = match node {
        Node::Directory(dir) => return summarize_dir(dir, name.to_string()),
        Node::File(_) => SummaryKind::File,
        Node::Link(_) => SummaryKind::Link,
        Node::Unreadable(_) => SummaryKind::Unreadable,
    };
    TreeSummary {
        name: name.to_string(),
        kind,
        fingerprint: node.fingerprint(),
        children: Vec::new(),
    }
}
