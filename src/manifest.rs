//! Manifest codec and persistence
//!
//! A manifest is the flat, persisted form of a scan: one entry per leaf keyed
//! by root-relative path, plus the root fingerprint. Directory fingerprints are
//! not stored; they are recomputed from the entries, and decoding rejects a
//! manifest whose stored root disagrees with its entries.
//!
//! On disk the manifest is pretty-printed JSON with a `version` field. Writes
//! go to a temporary sibling file that is then renamed over the target.

use crate::error::ScanError;
use crate::tree::node::{DirNode, FileNode, LinkNode, Node, SkipReason, UnreadableNode};
use crate::tree::path;
use crate::types::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Manifest format version written by this build.
pub const MANIFEST_VERSION: u64 = 1;

/// What a manifest entry stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    File,
    /// Directory symlink; `target` holds the link text
    Link,
    /// Entry that could not be read during the scan
    Unreadable,
}

impl EntryKind {
    fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }
}

/// One persisted leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub fingerprint: Fingerprint,
    pub size: u64,
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "EntryKind::is_file")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ManifestEntry {
    fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::File(f) => Some(Self {
                fingerprint: f.fingerprint,
                size: f.size,
                skipped: f.skipped(),
                kind: EntryKind::File,
                skip_reason: f.skip_reason,
                target: None,
            }),
            Node::Link(l) => Some(Self {
                fingerprint: l.fingerprint,
                size: 0,
                skipped: false,
                kind: EntryKind::Link,
                skip_reason: None,
                target: Some(l.target.clone()),
            }),
            Node::Unreadable(u) => Some(Self {
                fingerprint: u.fingerprint,
                size: 0,
                skipped: false,
                kind: EntryKind::Unreadable,
                skip_reason: None,
                target: None,
            }),
            Node::Directory(_) => None,
        }
    }

    fn to_node(&self, relative: &str) -> Result<Node, ScanError> {
        let node = match self.kind {
            EntryKind::File => Node::File(FileNode {
                path: relative.to_string(),
                fingerprint: self.fingerprint,
                size: self.size,
                skip_reason: if self.skipped {
                    Some(self.skip_reason.unwrap_or(SkipReason::TooLarge))
                } else {
                    None
                },
            }),
            EntryKind::Link => {
                let target = self.target.clone().ok_or_else(|| {
                    ScanError::ManifestCorrupt(format!("link entry {:?} has no target", relative))
                })?;
                let link = LinkNode::new(relative.to_string(), target);
                if link.fingerprint != self.fingerprint {
                    return Err(ScanError::ManifestCorrupt(format!(
                        "link entry {:?} fingerprint does not match its target",
                        relative
                    )));
                }
                Node::Link(link)
            }
            EntryKind::Unreadable => Node::Unreadable(UnreadableNode {
                path: relative.to_string(),
                fingerprint: self.fingerprint,
            }),
        };
        Ok(node)
    }
}

/// Persisted snapshot of one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u64,
    pub root_fingerprint: Fingerprint,
    /// RFC 3339 UTC timestamp; informational only
    pub scanned_at: String,
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Flatten a tree into a manifest stamped with the current time.
    pub fn from_tree(root: &DirNode) -> Self {
        let entries = root
            .leaves()
            .into_iter()
            .filter_map(|leaf| {
                ManifestEntry::from_node(leaf).map(|entry| (leaf.path().to_string(), entry))
            })
            .collect();
        Self {
            version: MANIFEST_VERSION,
            root_fingerprint: root.fingerprint,
            scanned_at: chrono::Utc::now().to_rfc3339(),
            entries,
        }
    }

    /// Rebuild the directory hierarchy implied by the entries.
    pub fn to_tree(&self) -> Result<DirNode, ScanError> {
        let leaves = self
            .entries
            .iter()
            .map(|(relative, entry)| entry.to_node(relative))
            .collect::<Result<Vec<_>, _>>()?;
        DirNode::assemble(leaves)
    }

    /// Root fingerprint implied by the entries alone.
    pub fn recompute_root(&self) -> Result<Fingerprint, ScanError> {
        Ok(self.to_tree()?.fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries excluded from content fingerprinting.
    pub fn skipped_count(&self) -> usize {
        self.entries.values().filter(|e| e.skipped).count()
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    /// Write the manifest atomically, creating parent directories as needed.
    #[instrument(skip(self), fields(path = %path.display(), entries = self.entries.len()))]
    pub fn save(&self, path: &Path) -> Result<(), ScanError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ScanError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create parent directory {:?}: {}", parent, e),
                ))
            })?;
        }

        let mut serialized = self.to_json()?;
        serialized.push('\n');

        let temp_path = temp_path(path);
        fs::write(&temp_path, serialized.as_bytes()).map_err(|e| {
            ScanError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write manifest to {:?}: {}", temp_path, e),
            ))
        })?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            ScanError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", path, e),
            ))
        })?;

        debug!("Manifest written");
        Ok(())
    }

    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let bytes = fs::read(path)?;
        deserialize(&bytes)
    }

    /// Read a manifest if a usable one exists.
    ///
    /// A missing, corrupt or incompatible manifest yields `None` so the
    /// caller falls back to a full scan. Other I/O failures are returned.
    pub fn load_or_none(path: &Path) -> Result<Option<Self>, ScanError> {
        match Self::load(path) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(ScanError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No prior manifest");
                Ok(None)
            }
            Err(err) if err.is_manifest_error() => {
                warn!(path = %path.display(), error = %err, "Discarding unusable manifest");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Staging file written by [`Manifest::save`] before the rename.
pub fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Flatten a tree into a manifest.
pub fn serialize(root: &DirNode) -> Manifest {
    Manifest::from_tree(root)
}

/// Decode and validate manifest bytes.
///
/// Fails with `ManifestIncompatibleVersion` for any version other than
/// [`MANIFEST_VERSION`] and with `ManifestCorrupt` for malformed JSON, missing
/// fields, non-normalized paths or a root that disagrees with the entries.
pub fn deserialize(bytes: &[u8]) -> Result<Manifest, ScanError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| ScanError::ManifestCorrupt(format!("invalid JSON: {}", e)))?;

    let version = value
        .as_object()
        .ok_or_else(|| ScanError::ManifestCorrupt("manifest is not a JSON object".to_string()))?
        .get("version")
        .ok_or_else(|| ScanError::ManifestCorrupt("missing version".to_string()))?
        .as_u64()
        .ok_or_else(|| ScanError::ManifestCorrupt("version is not an integer".to_string()))?;

    if version != MANIFEST_VERSION {
        return Err(ScanError::ManifestIncompatibleVersion {
            found: version,
            supported: MANIFEST_VERSION,
        });
    }

    let manifest: Manifest = serde_json::from_value(value)
        .map_err(|e| ScanError::ManifestCorrupt(e.to_string()))?;

    if let Some(bad) = manifest
        .entries
        .keys()
        .find(|key| path::normalize_relative(key) != **key)
    {
        return Err(ScanError::ManifestCorrupt(format!(
            "entry path {:?} is not normalized",
            bad
        )));
    }

    let recomputed = manifest.recompute_root()?;
    if recomputed != manifest.root_fingerprint {
        return Err(ScanError::ManifestCorrupt(format!(
            "root fingerprint {} does not match entries ({})",
            manifest.root_fingerprint.short(),
            recomputed.short()
        )));
    }

    Ok(manifest)
}
