//! Integration tests for scanning, manifests and diffing

mod ignore_rules;
mod manifest_persistence;
mod scenarios;
mod test_utils;
mod tree_determinism;

pub use test_utils::{scenario_root, with_xdg_env, write_file};
