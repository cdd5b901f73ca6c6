//! Drives the external `kind` cluster provisioner.
//!
//! The provisioner is opaque to this crate: [`ClusterProvider::create`] and
//! [`ClusterProvider::delete`] hand a cluster name and a set of named options
//! to the `kind` executable and report its verdict unchanged. Everything the
//! provisioner prints is pumped, as raw bytes, through per-stream
//! line-buffering writers so no partial line is lost or interleaved.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use kindling_logger::{ClusterLogger, LineBufferedWriter, Verbosity};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

static DEFAULT_EXECUTABLE: &str = "kind";

/// Named options forwarded unmodified to cluster creation.
///
/// Their effects are entirely defined by the provisioner; this crate only
/// maps them onto the flags the provisioner accepts.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Where the provisioner should write the cluster's kubeconfig.
    pub kubeconfig_path: Option<PathBuf>,

    /// Cluster configuration file handed to the provisioner.
    pub config_file: Option<PathBuf>,

    /// Node image override.
    pub node_image: Option<String>,

    /// How long the provisioner should wait for the control plane to be
    /// ready before giving up.
    pub wait: Option<Duration>,

    /// Keep nodes around after a failed create, for debugging.
    pub retain: bool,
}

/// Cluster lifecycle operations exposed by a provisioner.
#[async_trait]
pub trait ClusterProvider {
    /// Creates the named cluster.
    ///
    /// # Errors
    ///
    /// Returns the provisioner's failure unchanged; the logging path never
    /// contributes an error.
    async fn create(&self, name: &str, options: CreateOptions) -> Result<(), Error>;

    /// Deletes the named cluster, using the given kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns the provisioner's failure unchanged.
    async fn delete(&self, name: &str, kubeconfig_path: &Path) -> Result<(), Error>;
}

/// Runs the `kind` executable with its output captured line-by-line.
pub struct KindProvider {
    executable: PathBuf,
    logger: LineBufferedWriter,
}

impl KindProvider {
    /// Creates a provider that logs through `logger`.
    #[must_use]
    pub fn new(logger: LineBufferedWriter) -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            logger,
        }
    }

    /// Overrides the provisioner executable path.
    #[must_use]
    pub fn with_executable<P: AsRef<Path>>(mut self, executable: P) -> Self {
        self.executable = executable.as_ref().to_path_buf();
        self
    }

    async fn run(&self, scope: &str, args: Vec<String>) -> Result<(), Error> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("running provisioner: {:?}", cmd);
        self.logger.v(Verbosity::Debug(1)).infof(format_args!(
            "running {} {}",
            self.executable.display(),
            args.join(" ")
        ));

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Io("failed to spawn provisioner", e))?;

        let stdout = child.stdout.take().ok_or(Error::OutputCapture)?;
        let stderr = child.stderr.take().ok_or(Error::OutputCapture)?;

        // One writer per stream so partial lines never interleave.
        let stdout_task = tokio::spawn(pump(stdout, self.logger.scoped(scope)));
        let stderr_task = tokio::spawn(pump(stderr, self.logger.scoped(scope)));

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Io("failed to wait for provisioner", e))?;

        let _ = stdout_task.await;
        let _ = stderr_task.await;

        if !status.success() {
            self.logger
                .error(&format!("provisioner exited with {status}"));
            return Err(Error::NonZeroExit(status));
        }

        Ok(())
    }
}

#[async_trait]
impl ClusterProvider for KindProvider {
    async fn create(&self, name: &str, options: CreateOptions) -> Result<(), Error> {
        self.logger.logf(format_args!("creating cluster {name}"));
        self.run("create", build_create_args(name, &options)).await
    }

    async fn delete(&self, name: &str, kubeconfig_path: &Path) -> Result<(), Error> {
        self.logger.logf(format_args!("deleting cluster {name}"));
        self.run("delete", build_delete_args(name, kubeconfig_path))
            .await
    }
}

/// Reads raw chunks from `reader` into the writer until EOF, then flushes so
/// a trailing unterminated line is still emitted.
async fn pump<R>(mut reader: R, mut logger: LineBufferedWriter)
where
    R: AsyncRead + Unpin + Send,
{
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                // Writing into the adapter cannot fail.
                let _ = logger.write_all(&chunk[..n]);
            }
        }
    }
    let _ = logger.flush();
}

fn build_create_args(name: &str, options: &CreateOptions) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "cluster".to_string(),
        "--name".to_string(),
        name.to_string(),
    ];

    if let Some(path) = &options.kubeconfig_path {
        args.push("--kubeconfig".to_string());
        args.push(path.to_string_lossy().to_string());
    }
    if let Some(path) = &options.config_file {
        args.push("--config".to_string());
        args.push(path.to_string_lossy().to_string());
    }
    if let Some(image) = &options.node_image {
        args.push("--image".to_string());
        args.push(image.clone());
    }
    if let Some(wait) = options.wait {
        args.push("--wait".to_string());
        args.push(format!("{}s", wait.as_secs()));
    }
    if options.retain {
        args.push("--retain".to_string());
    }

    args
}

fn build_delete_args(name: &str, kubeconfig_path: &Path) -> Vec<String> {
    vec![
        "delete".to_string(),
        "cluster".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--kubeconfig".to_string(),
        kubeconfig_path.to_string_lossy().to_string(),
    ]
}
