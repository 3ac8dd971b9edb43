//! Tracing and logging setup shared by the trackers binaries.

/// Initialize process-wide logging with the defaults (JSON, `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&tracing::LogSettings::default());
}

/// Tracing configuration (filters, formats).
pub mod tracing;
