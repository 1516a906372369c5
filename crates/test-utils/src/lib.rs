//! Shared helpers for `buildgraph` integration tests.

pub mod builders;
pub mod fake_executor;
pub mod fake_probe;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Upper bound for any single async test.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a per-test tracing subscriber (only once per test binary).
///
/// Output goes through the test writer, so it shows up for failing tests
/// only. `RUST_LOG` overrides the default `buildgraph=debug` filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,buildgraph=debug"));

        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Await `fut`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}
