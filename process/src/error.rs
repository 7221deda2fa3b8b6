use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors returned while running an external program.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("i/o error while waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Returns true when the program could not be found on this host.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProcessError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }

    /// Returns true when the program was killed after its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout { .. })
    }
}
