//! Line-buffering log capture for subprocess output.
//!
//! External provisioning tools write unstructured bytes to their stdout and
//! stderr with no regard for line boundaries. [`LineBufferedWriter`] adapts
//! such a stream into discrete, prefixed, timestamped [`LogRecord`]s: bytes
//! accumulate until a newline completes a line, and any trailing partial line
//! is carried over to the next write (or released by a flush). Records are
//! handed to a shared [`LogSink`], either the [`tracing`] front door or an
//! in-memory capture for tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod record;
mod sink;
mod writer;

pub use record::LogRecord;
pub use sink::{LogSink, MemorySink, TracingSink};
pub use writer::{ClusterLogger, LeveledLogger, LineBufferedWriter, Verbosity};
