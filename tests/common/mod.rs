//! Common test utilities for cirrus-dl integration tests

#[allow(dead_code)]
pub mod archive;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use archive::*;
#[allow(unused_imports)]
pub use fixtures::*;
