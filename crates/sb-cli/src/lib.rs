//! signbridge: Command-line driver for the local signing agent
//!
//! Provides the `signbridge` CLI for checking the agent, listing the
//! certificates it can see and signing files with them.

pub mod commands;
pub mod output;
