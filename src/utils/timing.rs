// file: src/utils/timing.rs
// description: deadlines for backend calls and operation timers
// reference: https://docs.rs/tokio/latest/tokio/time/fn.timeout.html

use crate::error::{Result, XplorerError};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runs `fut` under `limit`; an elapsed deadline surfaces as a retriable `Unavailable`.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "{} exceeded its deadline of {}ms",
                operation,
                limit.as_millis()
            );
            Err(XplorerError::Unavailable(format!(
                "{} timed out after {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}

pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        debug!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        debug!(
            "Completed operation: {} in {:.3}s",
            self.operation,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed operation: {} - {} items in {:.2}s ({:.2} items/sec)",
            self.operation,
            count,
            elapsed.as_secs_f64(),
            if elapsed.as_secs_f64() > 0.0 {
                count as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            }
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_maps_to_unavailable() {
        let result: Result<()> = with_deadline("sleepy", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, XplorerError::Unavailable(_)));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_deadline_passes_inner_errors_through() {
        let result: Result<()> = with_deadline("fast", Duration::from_secs(1), async {
            Err(XplorerError::PaperNotFound("x".into()))
        })
        .await;

        assert!(matches!(result, Err(XplorerError::PaperNotFound(_))));
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test");
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }
}
