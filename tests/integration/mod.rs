//! Integration tests for rowshift.

pub mod common;
pub mod materialize_test;
pub mod provision_test;
pub mod schema_test;
