//! Configuration management for CLI tools.
//!
//! Configuration is stored in ~/.voxguard/{app_name}/config.yaml as a set of
//! named contexts, one of which is current.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxguard_pipeline::PipelineConfig;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".voxguard";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Environment variables consulted, in order, when no API key is configured.
pub const API_KEY_ENV: [&str; 2] = ["VOXGUARD_API_KEY", "API_KEY"];

/// Languages accepted by the HTTP service unless configured otherwise.
pub const DEFAULT_LANGUAGES: [&str; 5] = ["Tamil", "English", "Hindi", "Malayalam", "Telugu"];

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// One named deployment: how to run the pipeline and how to serve it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address; `:3000` binds every interface.
    pub listen: String,

    /// Expected `x-api-key` header value. `$VAR` and `${VAR}` are expanded.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Accepted values of the request's `language` field.
    pub languages: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: ":3000".to_string(),
            api_key: String::new(),
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// The API key to enforce, if any.
    ///
    /// Falls back to the variables in [`API_KEY_ENV`] when the configured
    /// value is empty or expands to nothing.
    pub fn resolve_api_key(&self) -> Option<String> {
        let configured = expand_env(&self.api_key);
        if !configured.is_empty() {
            return Some(configured);
        }
        API_KEY_ENV
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.is_empty())
    }

    /// Parses [`ServerConfig::listen`].
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        parse_addr(&self.listen)
    }
}

/// Parses `host:port`, or `:port` for every interface.
pub fn parse_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    addr.parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {}", addr, e))
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        if self.current_context.is_empty() {
            self.current_context = name.to_string();
        }
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    /// Gets the current context.
    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or current context if name is empty.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.contexts.get(n),
            _ => self.get_current_context(),
        }
    }

    /// Like [`Config::resolve_context`], but with no contexts at all the
    /// built-in defaults are used.
    pub fn context_or_default(&self, name: Option<&str>) -> anyhow::Result<Context> {
        if let Some(ctx) = self.resolve_context(name) {
            return Ok(ctx.clone());
        }
        match name {
            Some(n) if !n.is_empty() => anyhow::bail!("context '{}' not found", n),
            _ if self.contexts.is_empty() => Ok(Context::default()),
            _ => anyhow::bail!(
                "no context specified. Use -c flag or set a default context with \
                 'voxguard config use-context'"
            ),
        }
    }

    /// Lists all context names, sorted.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

fn config_path(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<PathBuf> {
    match custom_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path")),
    }
}

/// Loads configuration for the specified app.
///
/// A missing file yields an empty configuration; nothing is written until
/// the configuration is saved.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = config_path(app_name, custom_path)?;

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("parse {}: {}", config_path.display(), e))?
        }
    } else {
        Config::default()
    };

    for (name, ctx) in cfg.contexts.iter_mut() {
        if ctx.name.is_empty() {
            ctx.name = name.clone();
        }
    }
    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Saves configuration to the specified path.
pub fn save_config(
    app_name: &str,
    config: &Config,
    custom_path: Option<&str>,
) -> anyhow::Result<()> {
    let config_path = config_path(app_name, custom_path)?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_yaml::to_string(config)?;
    std::fs::write(&config_path, content)?;
    Ok(())
}

/// Expands a value of the form `$VAR` or `${VAR}`; other values are returned as is.
pub fn expand_env(s: &str) -> String {
    if !s.starts_with('$') {
        return s.to_string();
    }
    let var_name = if s.starts_with("${") && s.ends_with('}') {
        &s[2..s.len() - 1]
    } else {
        &s[1..]
    };
    std::env::var(var_name).unwrap_or_default()
}

/// Masks the API key for display.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(dir: &tempfile::TempDir) -> String {
        dir.path().join("nested").join("config.yaml").display().to_string()
    }

    #[test]
    fn test_load_missing_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_config(&dir);
        let cfg = load_config("voxguard", Some(&path)).unwrap();
        assert!(cfg.contexts.is_empty());
        assert_eq!(cfg.app_name, "voxguard");
        assert_eq!(cfg.path(), Path::new(&path));
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_config(&dir);

        let mut cfg = Config::default();
        let mut ctx = Context::default();
        ctx.server.api_key = "$VOXGUARD_TEST_KEY".to_string();
        ctx.pipeline.expose_diagnostics = true;
        cfg.contexts.insert("prod".to_string(), ctx);
        cfg.current_context = "prod".to_string();
        save_config("voxguard", &cfg, Some(&path)).unwrap();

        let loaded = load_config("voxguard", Some(&path)).unwrap();
        let ctx = loaded.get_current_context().unwrap();
        assert_eq!(ctx.name, "prod");
        assert_eq!(ctx.server.api_key, "$VOXGUARD_TEST_KEY");
        assert!(ctx.pipeline.expose_diagnostics);
        assert_eq!(ctx.server.languages.len(), 5);
    }

    #[test]
    fn test_context_management() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_config(&dir);
        save_config("voxguard", &Config::default(), Some(&path)).unwrap();
        let mut cfg = load_config("voxguard", Some(&path)).unwrap();

        cfg.add_context("local", Context::default()).unwrap();
        assert_eq!(cfg.current_context, "local");
        cfg.add_context("staging", Context::default()).unwrap();
        assert_eq!(cfg.list_contexts(), vec!["local", "staging"]);

        cfg.use_context("staging").unwrap();
        assert_eq!(cfg.resolve_context(None).unwrap().name, "staging");
        assert_eq!(cfg.resolve_context(Some("local")).unwrap().name, "local");
        assert!(cfg.use_context("missing").is_err());

        cfg.delete_context("staging").unwrap();
        assert!(cfg.current_context.is_empty());
        assert!(cfg.delete_context("staging").is_err());

        let reloaded = load_config("voxguard", Some(&path)).unwrap();
        assert_eq!(reloaded.list_contexts(), vec!["local"]);
    }

    #[test]
    fn test_context_or_default() {
        let cfg = Config::default();
        let ctx = cfg.context_or_default(None).unwrap();
        assert_eq!(ctx.server, ServerConfig::default());
        assert!(cfg.context_or_default(Some("prod")).is_err());

        let mut cfg = Config::default();
        cfg.contexts.insert("a".to_string(), Context::default());
        assert!(cfg.context_or_default(None).is_err());
    }

    #[test]
    fn test_partial_yaml() {
        let cfg: Config = serde_yaml::from_str(
            r#"
current_context: dev
contexts:
  dev:
    pipeline:
      backend:
        kind: bridge
        args: [ai_engine/bridge.py]
    server:
      listen: "127.0.0.1:8080"
"#,
        )
        .unwrap();
        let ctx = cfg.get_current_context().unwrap();
        assert_eq!(ctx.pipeline.backend.kind(), "bridge");
        assert_eq!(ctx.server.listen_addr().unwrap().port(), 8080);
        assert_eq!(ctx.server.languages, DEFAULT_LANGUAGES.to_vec());
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr(":3000").unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(parse_addr("127.0.0.1:80").unwrap().port(), 80);
        assert!(parse_addr("nowhere").is_err());
    }

    #[test]
    fn test_expand_env() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("VOXGUARD_EXPAND_TEST", "secret") };
        assert_eq!(expand_env("$VOXGUARD_EXPAND_TEST"), "secret");
        assert_eq!(expand_env("${VOXGUARD_EXPAND_TEST}"), "secret");
        assert_eq!(expand_env("$VOXGUARD_EXPAND_TEST_UNSET"), "");
        assert_eq!(expand_env("plain"), "plain");
        assert_eq!(expand_env(""), "");
    }

    #[test]
    fn test_resolve_api_key_prefers_configured_value() {
        let server = ServerConfig {
            api_key: "configured".to_string(),
            ..Default::default()
        };
        assert_eq!(server.resolve_api_key().as_deref(), Some("configured"));
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("sk-1234567890abcd"), "sk-1*********abcd");
    }
}
