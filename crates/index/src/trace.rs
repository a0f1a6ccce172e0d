use std::future::Future;
use std::time::Instant;

use crate::{IndexError, Namespace};

/// Run one index operation, logging started / completed / failed with its elapsed time.
pub async fn traced<T, F>(
    operation: &'static str,
    namespace: &Namespace,
    count: usize,
    fut: F,
) -> Result<T, IndexError>
where
    F: Future<Output = Result<T, IndexError>>,
{
    let started = Instant::now();
    tracing::debug!(operation, namespace = %namespace, count, "index operation started");

    let result = fut.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            tracing::info!(operation, namespace = %namespace, count, elapsed_ms, "index operation completed")
        }
        Err(error) => {
            tracing::error!(operation, namespace = %namespace, count, elapsed_ms, %error, "index operation failed")
        }
    }
    result
}
