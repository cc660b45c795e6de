//! pmscout core - shared plumbing for the harvester
//!
//! Blocking HTTP over a shared async client, retry with backoff, an atomic
//! CSV sink, and the logging / progress / interruption setup used by the CLI.

pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod sink;

// Re-exports for convenience
pub use http::{HttpError, get_text};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use shutdown::{
    INTERRUPTED_EXIT_CODE, install_signal_handlers, is_shutdown_requested, request_shutdown,
};
pub use sink::CsvSink;
