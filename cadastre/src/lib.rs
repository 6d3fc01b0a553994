//! Settings and wiring of the `cadastre-tiles` command line tool.

pub mod config;
pub use config::Config;
