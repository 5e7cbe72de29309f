//! CLI subcommand implementations.

pub mod add;
pub mod delete;
pub mod edit;
pub mod history;
pub mod replay;
pub mod reset;
pub mod simulate;
pub mod status;
pub mod totals;
pub mod util;
