//! Distance tracker CLI library.
//!
//! This crate provides the `kmtrack` terminal shell over the tracking engine
//! and the trip ledger.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
