//! Shared logging setup for apflow services.

pub mod tracing;

/// Initialize process-wide logging.
///
/// Idempotent: calling it again after the subscriber is installed does
/// nothing, so tests and embedders may call it freely.
pub fn init() {
    tracing::init();
}
