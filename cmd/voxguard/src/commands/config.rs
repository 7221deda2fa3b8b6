//! Configuration management commands.

use clap::{Args, Subcommand, ValueEnum};
use voxguard_cli::{Context, mask_api_key};
use voxguard_detect::{BackendConfig, BridgeConfig, HeuristicConfig};

use super::{get_config, output, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts allow you to keep several deployments (local, staging, ...)
/// side by side, similar to kubectl's context management.
///
/// Configuration is stored in ~/.voxguard/voxguard/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    Heuristic,
    Bridge,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Create or replace a context with default settings
    Init {
        /// Context name
        #[arg(default_value = "default")]
        name: String,
        /// API key expected in x-api-key (supports $VAR)
        #[arg(long)]
        api_key: Option<String>,
        /// Classification backend
        #[arg(long, value_enum, default_value = "heuristic")]
        backend: BackendKind,
        /// Inference script run by the bridge backend
        #[arg(long, default_value = "ai_engine/bridge.py")]
        bridge_script: String,
        /// Scratch directory for per-request files
        #[arg(long)]
        scratch_dir: Option<String>,
        /// Listen address for `serve`
        #[arg(long)]
        listen: Option<String>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// List all contexts
    #[command(name = "list", alias = "list-contexts")]
    List,
    /// Show the selected context (API key masked)
    Show,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Init {
                name,
                api_key,
                backend,
                bridge_script,
                scratch_dir,
                listen,
            } => {
                let mut cfg = get_config(cli)?;

                let mut ctx = Context::default();
                ctx.pipeline.backend = match backend {
                    BackendKind::Heuristic => BackendConfig::Heuristic(HeuristicConfig::default()),
                    BackendKind::Bridge => BackendConfig::Bridge(BridgeConfig {
                        args: vec![bridge_script.clone()],
                        ..Default::default()
                    }),
                };
                if let Some(dir) = scratch_dir {
                    ctx.pipeline.scratch_dir = dir.into();
                }
                if let Some(key) = api_key {
                    ctx.server.api_key = key.clone();
                }
                if let Some(listen) = listen {
                    ctx.server.listen = listen.clone();
                }

                cfg.add_context(name, ctx)?;
                print_success(&format!(
                    "Context \"{}\" written to {}",
                    name,
                    cfg.path().display()
                ));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::List => {
                let cfg = get_config(cli)?;

                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<12} {}", "CURRENT", "NAME", "BACKEND", "LISTEN");
                for name in cfg.list_contexts() {
                    let Some(ctx) = cfg.contexts.get(name) else {
                        continue;
                    };
                    let current = if name == cfg.current_context { "*" } else { "" };
                    println!(
                        "{:<8} {:<20} {:<12} {}",
                        current,
                        name,
                        ctx.pipeline.backend.kind(),
                        ctx.server.listen
                    );
                }
                Ok(())
            }

            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                let mut ctx = cfg.context_or_default(cli.context.as_deref())?;
                if !ctx.server.api_key.is_empty() && !ctx.server.api_key.starts_with('$') {
                    ctx.server.api_key = mask_api_key(&ctx.server.api_key);
                }
                output(cli).write(&ctx)
            }
        }
    }
}
