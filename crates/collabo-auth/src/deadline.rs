//! Bounded store calls

use std::future::Future;
use std::time::Duration;

use collabo_db::DbError;
use tracing::warn;

use crate::error::AuthError;

/// Await a store call, giving up with [`AuthError::Timeout`] after `limit`
pub(crate) async fn bounded<T, F>(limit: Duration, op: &'static str, call: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => {
            warn!("Store call {} exceeded {:?}", op, limit);
            Err(AuthError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let result: Result<(), AuthError> = bounded(Duration::from_millis(20), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AuthError::Timeout)));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let value = bounded(Duration::from_secs(1), "fast", async { Ok::<_, DbError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let err = bounded(Duration::from_secs(1), "dup", async {
            Err::<(), _>(DbError::DuplicateEmail("x@example.com".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::EmailConflict));
    }
}
