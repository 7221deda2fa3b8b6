use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{BridgeClassifier, BridgeConfig, Classifier, HeuristicClassifier, HeuristicConfig};

/// Selects and configures the classification backend.
///
/// ```yaml
/// backend:
///   kind: bridge
///   program: python3
///   args: [ai_engine/bridge.py]
///   timeout_secs: 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Heuristic(HeuristicConfig),
    Bridge(BridgeConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Heuristic(HeuristicConfig::default())
    }
}

impl BackendConfig {
    /// Builds the configured classifier.
    pub fn build(&self) -> Arc<dyn Classifier> {
        match self {
            BackendConfig::Heuristic(cfg) => Arc::new(HeuristicClassifier::new(cfg.clone())),
            BackendConfig::Bridge(cfg) => Arc::new(BridgeClassifier::new(cfg.clone())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Heuristic(_) => "heuristic",
            BackendConfig::Bridge(_) => "bridge",
        }
    }
}
