//! Process-wide logging setup shared by the binaries.

pub mod logging;

/// Initialize structured logging for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init(logging::LogFormat::from_env());
}
