//! Test harness for provisioning throwaway clusters with captured logs.
//!
//! A [`ClusterHarness`] wires a [`KindProvider`] over an in-memory capture
//! sink, holds the session's kubeconfig in a scratch directory, and exposes
//! the captured records for assertion or JSON export once the provider has
//! flushed them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use kindling_logger::{LineBufferedWriter, LogRecord, LogSink, MemorySink};
use kindling_provider::{ClusterProvider, CreateOptions, KindProvider};
use tempfile::TempDir;
use tracing::info;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber once per test binary.
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Provisions uniquely-named clusters and captures everything they log.
pub struct ClusterHarness {
    session_id: String,
    scratch_dir: TempDir,
    sink: Arc<MemorySink>,
    provider: KindProvider,
}

impl ClusterHarness {
    /// Create a harness builder.
    #[must_use]
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// The session ID scoping this harness's clusters.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Where this session's kubeconfig lives.
    #[must_use]
    pub fn kubeconfig_path(&self) -> PathBuf {
        self.scratch_dir.path().join("kubeconfig")
    }

    /// A cluster name unique to this session.
    #[must_use]
    pub fn cluster_name(&self, label: &str) -> String {
        format!("{label}-{}", self.session_id)
    }

    /// Creates a cluster, writing its kubeconfig into the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns the provisioner's failure unchanged, with context added.
    pub async fn create_cluster(&self, name: &str) -> Result<()> {
        info!("creating cluster {name}");

        let options = CreateOptions {
            kubeconfig_path: Some(self.kubeconfig_path()),
            ..CreateOptions::default()
        };

        self.provider
            .create(name, options)
            .await
            .with_context(|| format!("failed to create cluster {name}"))
    }

    /// Deletes a cluster created by this harness.
    ///
    /// # Errors
    ///
    /// Returns the provisioner's failure unchanged, with context added.
    pub async fn delete_cluster(&self, name: &str) -> Result<()> {
        info!("deleting cluster {name}");

        self.provider
            .delete(name, &self.kubeconfig_path())
            .await
            .with_context(|| format!("failed to delete cluster {name}"))
    }

    /// Records captured so far, in emission order.
    #[must_use]
    pub fn captured_records(&self) -> Vec<LogRecord> {
        self.sink.records()
    }

    /// Just the captured messages, in emission order.
    #[must_use]
    pub fn captured_messages(&self) -> Vec<String> {
        self.sink.messages()
    }

    /// Export the captured records as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing the file fails.
    pub fn export_records(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.captured_records())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write records to {}", path.display()))?;
        Ok(())
    }
}

/// Builder for a [`ClusterHarness`].
#[derive(Default)]
pub struct HarnessBuilder {
    session_id: Option<String>,
    executable: Option<PathBuf>,
}

impl HarnessBuilder {
    /// Set the session ID (defaults to a fresh UUID).
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Override the provisioner executable (useful for tests).
    #[must_use]
    pub fn with_executable<P: AsRef<Path>>(mut self, executable: P) -> Self {
        self.executable = Some(executable.as_ref().to_path_buf());
        self
    }

    /// Build the harness.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directory cannot be created.
    pub fn build(self) -> Result<ClusterHarness> {
        let session_id = self
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let scratch_dir = TempDir::new().context("failed to create scratch directory")?;

        let sink = Arc::new(MemorySink::new());
        let logger = LineBufferedWriter::new(Arc::clone(&sink) as Arc<dyn LogSink>, "kind");

        let mut provider = KindProvider::new(logger);
        if let Some(executable) = self.executable {
            provider = provider.with_executable(executable);
        }

        Ok(ClusterHarness {
            session_id,
            scratch_dir,
            sink,
            provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_a_unique_session() {
        let first = ClusterHarness::builder().build().unwrap();
        let second = ClusterHarness::builder().build().unwrap();

        assert_ne!(first.session_id(), second.session_id());
        assert!(first.kubeconfig_path().starts_with(first.scratch_dir.path()));
    }

    #[test]
    fn cluster_names_are_session_scoped() {
        let harness = ClusterHarness::builder()
            .with_session_id("abc123")
            .build()
            .unwrap();

        assert_eq!(harness.cluster_name("demo"), "demo-abc123");
    }
}
