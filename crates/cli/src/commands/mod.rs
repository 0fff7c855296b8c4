//! Subcommand implementations

pub mod downscale;
pub mod ilm;
pub mod profiles;
pub mod regions;
