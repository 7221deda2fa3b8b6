use std::path::Path;

use async_trait::async_trait;
use voxguard_audio::CanonicalSignal;

use crate::{ClassificationResult, ClassifierError};

/// Everything a backend may look at for one request.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    /// The canonical signal produced by the transcoder.
    pub signal: &'a CanonicalSignal,
    /// The decoded upload as written to scratch space, before transcoding.
    pub source: &'a Path,
    /// Declared language, passed through untouched.
    pub language: &'a str,
}

/// A pluggable human-vs-synthetic voice classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Classifies one signal.
    async fn classify(
        &self,
        input: &ClassifyInput<'_>,
    ) -> Result<ClassificationResult, ClassifierError>;
}
