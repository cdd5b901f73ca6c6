//! Error types for the provider crate.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Error type for cluster provisioning calls.
///
/// The logging path contributes no variants here: provisioner errors surface
/// unchanged to the caller, and the log adapter itself cannot fail.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("io error ({0}): {1}")]
    Io(&'static str, #[source] io::Error),

    /// A stdio pipe was unavailable on the spawned provisioner.
    #[error("failed to capture provisioner output")]
    OutputCapture,

    /// The provisioner exited with a non-zero status.
    #[error("provisioner exited with non-zero: {0}")]
    NonZeroExit(ExitStatus),
}
