//! Bounded execution of external programs.
//!
//! Both the codec toolchain and the bridge classifier are separate
//! programs. [`Invocation`] runs one of them to completion, captures its
//! standard output and error streams, and kills it when the configured
//! timeout elapses.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use voxguard_process::Invocation;
//!
//! # async fn run() -> Result<(), voxguard_process::ProcessError> {
//! let output = Invocation::new("ffmpeg")
//!     .arg("-version")
//!     .timeout(Duration::from_secs(5))
//!     .run()
//!     .await?;
//! assert!(output.success());
//! # Ok(())
//! # }
//! ```

mod error;
mod invocation;

pub use error::ProcessError;
pub use invocation::{DEFAULT_TIMEOUT, Invocation, Output, truncate_diagnostic};
