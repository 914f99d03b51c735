//! CLI subcommand implementations.

pub mod add_league;
pub mod add_prospect;
pub mod add_team;
pub mod init;
pub mod leagues;
pub mod prospects;
pub mod teams;
