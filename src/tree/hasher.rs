//! Fingerprint composition using BLAKE3
//!
//! File content is hashed with plain BLAKE3 so a file's fingerprint is the
//! digest of its exact bytes. Every other fingerprint (size-only, link,
//! unreadable, directory) is computed in BLAKE3 key-derivation mode with its
//! own context string, so values from different domains never collide.

use crate::types::Fingerprint;
use blake3::Hasher;

const SKIPPED_CONTEXT: &str = "mercator 2024-06-01 skipped file size v1";
const LINK_CONTEXT: &str = "mercator 2024-06-01 directory link target v1";
const UNREADABLE_CONTEXT: &str = "mercator 2024-06-01 unreadable entry v1";
const DIRECTORY_CONTEXT: &str = "mercator 2024-06-01 directory children v1";

/// Fingerprint of a fully read file.
pub fn content_fingerprint(content: &[u8]) -> Fingerprint {
    blake3::hash(content).into()
}

/// Fresh hasher for incremental content fingerprinting.
///
/// `content_hasher().update(x).finalize()` equals `content_fingerprint(x)`.
pub fn content_hasher() -> Hasher {
    Hasher::new()
}

/// Fingerprint of a file excluded from content hashing, derived from its size.
pub fn skipped_fingerprint(size: u64) -> Fingerprint {
    let mut hasher = Hasher::new_derive_key(SKIPPED_CONTEXT);
    hasher.update(&size.to_be_bytes());
    hasher.finalize().into()
}

/// Fingerprint of a directory symlink, derived from its target as written.
pub fn link_fingerprint(target: &str) -> Fingerprint {
    let mut hasher = Hasher::new_derive_key(LINK_CONTEXT);
    hasher.update(target.as_bytes());
    hasher.finalize().into()
}

/// Fixed sentinel for entries that could not be read.
pub fn unreadable_fingerprint() -> Fingerprint {
    Hasher::new_derive_key(UNREADABLE_CONTEXT).finalize().into()
}

/// Fingerprint of a directory from its `(name, fingerprint)` children.
///
/// Children are sorted by name before hashing, so the result does not depend
/// on the order they were discovered in.
///
/// Fingerprint = H(count || for each child: name_len || name || child_fingerprint)
pub fn directory_fingerprint<'a, I>(children: I) -> Fingerprint
where
    I: IntoIterator<Item = (&'a str, Fingerprint)>,
{
    let mut sorted: Vec<(&str, Fingerprint)> = children.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Hasher::new_derive_key(DIRECTORY_CONTEXT);

    // Hash children count (8 bytes, big-endian)
    hasher.update(&(sorted.len() as u64).to_be_bytes());

    for (name, fingerprint) in &sorted {
        // Length prefix keeps ("ab", x) distinct from ("a", "b"...)
        hasher.update(&(name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(fingerprint.as_bytes());
    }

    hasher.finalize().into()
}
