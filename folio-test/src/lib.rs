mod dao;
mod fixtures;

pub use dao::{CallLog, InMemoryDao, MemoryError, Op};
pub use fixtures::{people, Person};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
