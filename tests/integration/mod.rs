//! Integration tests for stepviz
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod player_flow;
pub mod replay_flow;
