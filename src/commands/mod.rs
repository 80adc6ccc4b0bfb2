//! CLI subcommands

pub mod export;
pub mod list;
pub mod render;
