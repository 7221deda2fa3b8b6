//! CLI commands module.

mod analyze;
mod config;
mod serve;
mod util;

pub use analyze::AnalyzeCommand;
pub use config::ConfigCommand;
pub use serve::ServeCommand;

pub(crate) use util::*;
