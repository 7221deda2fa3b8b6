//! CLI utilities for voxguard.
//!
//! Configuration contexts stored under `~/.voxguard/<app>/` and result
//! printing shared by the binaries.

pub mod config;
pub mod output;

pub use config::{Config, Context, ServerConfig, expand_env, load_config, mask_api_key, save_config};
pub use output::{Output, OutputFormat};
