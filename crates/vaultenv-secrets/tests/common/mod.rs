//! Common test infrastructure for vaultenv-secrets integration tests
//!
//! - `mock_server`: wiremock helpers for KV v2 reads
//! - `fakes`: in-process KMS and backend implementations
//! - `fixtures`: deployment config builders

// Not every test file uses every helper
#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;
pub mod mock_server;

pub use fakes::*;
pub use fixtures::*;
pub use mock_server::*;
