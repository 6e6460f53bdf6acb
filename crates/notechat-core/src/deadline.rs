//! Bounded waits on remote calls.
//!
//! The call runs on its own task. When the deadline passes first we stop
//! waiting and report [`Error::Timeout`]; the task itself is not aborted and
//! is reclaimed by the runtime once it finishes.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

/// Run `fut` on a spawned task and wait at most `limit` for its result.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(fut);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::Internal(format!("worker task failed: {}", join_err))),
        Err(_) => {
            warn!("Gave up waiting after {:?}", limit);
            Err(Error::Timeout(limit))
        }
    }
}
