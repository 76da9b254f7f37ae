use std::sync::Once;

static INIT: Once = Once::new();

/// Install a `tracing` subscriber reading `RUST_LOG` (default `info`). The
/// library itself never calls this — it only emits events — so embedders that
/// don't want a subscriber installed are free to ignore this module entirely.
/// Idempotent: later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    });
}
