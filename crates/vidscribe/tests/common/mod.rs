//! Shared test utilities for vidscribe integration tests.
//!
//! - `TestHarness` for isolated runs over temp directories
//! - fake capabilities that can be held mid-stage or made to fail

pub mod fakes;
pub mod harness;

pub use harness::TestHarness;
