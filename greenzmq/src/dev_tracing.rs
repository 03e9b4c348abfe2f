/// Development helper: initialize tracing subscriber when `RUST_LOG` is set.
///
/// Tests can call `greenzmq::dev_tracing::init_tracing()` to see lock
/// handovers and gate wakeups. This is a no-op when `RUST_LOG` is not set
/// or when a global subscriber is already installed.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
