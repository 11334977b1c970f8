//! Command handlers for the vlmweave CLI.
//!
//! Each submodule handles one CLI command or command group.
//! The dispatch logic remains in main.rs.

pub mod config;
pub mod render;
