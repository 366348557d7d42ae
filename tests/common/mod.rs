//! Shared test utilities for stepviz
//!
//! - Trace fixtures built as command streams
//! - Temporary directories holding trace files and a data dir

pub mod fixtures;
pub mod traces;
