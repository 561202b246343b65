//! Property-based tests for determinism and diff guarantees

mod determinism;
mod diff_agreement;
