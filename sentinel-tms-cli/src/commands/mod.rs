//! CLI subcommands.

pub mod config;
pub mod serve;
pub mod tile;
pub mod zone;
