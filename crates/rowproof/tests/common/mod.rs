//! Shared test utilities for rowproof integration tests.
//!
//! This module provides:
//! - `TestHarness` with a temp-file database and an in-memory blob store
//! - `ScriptedRecognizer` for deterministic recognizer behavior
//! - Builders for training entries and structured guesses

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{MemoryBlobStore, Script, ScriptedRecognizer, TestHarness};
