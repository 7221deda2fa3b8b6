//! Classification of a canonical signal as human or synthetic speech.
//!
//! # Architecture
//!
//! Every backend implements [`Classifier`]. The pipeline holds an
//! `Arc<dyn Classifier>` built from a [`BackendConfig`] and never looks at
//! which variant it got.
//!
//! - [`HeuristicClassifier`]: in-process, decides on the canonical signal's
//!   byte length. A placeholder with no acoustic discrimination.
//! - [`BridgeClassifier`]: runs an external inference program and reads one
//!   JSON verdict from its standard output.
//!
//! # Bridge protocol
//!
//! ```text
//! <program> [args...] <audio path> <declared language>
//!
//! stdout (exit status 0):
//! {"classification":"AI_GENERATED","confidenceScore":0.93,"explanation":"..."}
//! ```

mod bridge;
mod classifier;
mod config;
mod error;
mod heuristic;
mod types;

pub use bridge::{BridgeClassifier, BridgeConfig, BridgeInput};
pub use classifier::{Classifier, ClassifyInput};
pub use config::BackendConfig;
pub use error::ClassifierError;
pub use heuristic::{DEFAULT_THRESHOLD_BYTES, HeuristicClassifier, HeuristicConfig};
pub use types::{Classification, ClassificationResult};
