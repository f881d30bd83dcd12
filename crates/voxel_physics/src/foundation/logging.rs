//! Logging setup for the physics core
//!
//! The crate only emits through the `log` facade; binaries and tests pick the
//! backend. `env_logger` is the default backend, configured via `RUST_LOG`.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging backend from the environment (`RUST_LOG`)
pub fn init() {
    env_logger::init();
}

/// Initialize logging for unit tests.
///
/// Safe to call from every test: repeated initialization is ignored and the
/// output is captured by the test harness.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
