//! Cancel-on-dependency-change for page loads.
//!
//! Each page keeps one scope per reactive input (e.g. the selected group).
//! Starting a load cancels the previous one; dropping the scope cancels the
//! load in flight. A superseded load never reports its result.

use crate::domain::ApiError;
use std::future::Future;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Result of a scoped load.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The load was still current when it finished.
    Current(Result<T, ApiError>),
    /// A newer load (or teardown) replaced this one; its result is discarded.
    Superseded,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    token: Option<CancellationToken>,
}

#[derive(Debug, Default)]
pub struct RequestScope {
    slot: Mutex<Slot>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cancel the load in flight and open a new generation.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut slot = self.slot();
        if let Some(previous) = slot.token.take() {
            previous.cancel();
        }
        slot.generation += 1;
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        (slot.generation, token)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.slot().generation == generation
    }

    /// Cancel whatever is in flight without starting anything new.
    pub fn cancel(&self) {
        let mut slot = self.slot();
        slot.generation += 1;
        if let Some(token) = slot.token.take() {
            token.cancel();
        }
    }

    /// Run `load` with a fresh token, superseding any earlier load in this scope.
    pub async fn run<T, F, Fut>(&self, load: F) -> Outcome<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let (generation, token) = self.begin();
        let result = load(token).await;
        if self.is_current(generation) {
            self.slot().token = None;
            Outcome::Current(result)
        } else {
            Outcome::Superseded
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    async fn wait_or_abort(token: CancellationToken, value: i32) -> Result<i32, ApiError> {
        tokio::select! {
            _ = token.cancelled() => Err(ApiError::Aborted {
                method: "GET".into(),
                path: "/test".into(),
            }),
            _ = tokio::time::sleep(Duration::from_millis(200)) => Ok(value),
        }
    }

    #[tokio::test]
    async fn test_newer_load_supersedes_older() {
        let scope = Arc::new(RequestScope::new());
        let first = {
            let scope = Arc::clone(&scope);
            tokio::spawn(async move { scope.run(|t| wait_or_abort(t, 1)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = scope.run(|_| async move { Ok::<_, ApiError>(2) }).await;

        assert!(matches!(second, Outcome::Current(Ok(2))));
        assert!(matches!(first.await.unwrap(), Outcome::Superseded));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_token() {
        let scope = RequestScope::new();
        let (generation, token) = scope.begin();
        scope.cancel();
        assert!(token.is_cancelled());
        assert!(!scope.is_current(generation));
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let scope = RequestScope::new();
        let (_, token) = scope.begin();
        drop(scope);
        assert!(token.is_cancelled());
    }
}
