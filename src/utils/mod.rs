//! Shared utilities

pub mod lock;
pub mod logging;

// Re-export commonly used items
pub use lock::{with_lock, with_read_lock, with_write_lock};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
