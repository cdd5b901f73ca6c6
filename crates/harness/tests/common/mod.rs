//! Common test setup for harness integration tests

use kindling_harness::{ClusterHarness, init_test_logging};

/// A harness whose "provisioner" is `echo`, so the command line comes back
/// on stdout and lands in the capture sink.
pub fn echo_harness() -> ClusterHarness {
    init_test_logging();

    ClusterHarness::builder()
        .with_session_id("itest")
        .with_executable("echo")
        .build()
        .expect("failed to build harness")
}
