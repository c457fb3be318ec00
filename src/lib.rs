pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod models;
pub mod parser;
pub mod plan;
pub mod schedule;

pub use config::Config;
pub use error::{MortyError, Result};
