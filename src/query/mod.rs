//! Query materialization for rowshift.
//!
//! Runs a query against a provisioned source and turns every cell into a SQL
//! literal token.

pub mod materializer;
pub mod normalize;
pub mod observer;

pub use materializer::{materialize, MaterializeError, Materializer};
pub use normalize::{is_numeric, literal_text, normalize_cell, NormalizeOptions, NULL_TOKEN};
pub use observer::{NoopObserver, QueryObserver, TracingObserver};
