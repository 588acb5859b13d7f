// Single-flight refresh coordination
// One refresh in flight per client; everyone else waits in a FIFO queue

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::error::{NetworkError, RefreshError};

/// Result delivered to every waiter when a refresh settles
pub type RefreshOutcome = Result<String, RefreshError>;

#[derive(Default)]
struct RefreshState {
    /// Set while a refresh call is in flight
    refreshing: bool,

    /// Waiters queued behind the in-flight refresh, in arrival order.
    /// Only non-empty while `refreshing` is true.
    pending: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Refresh-in-progress flag plus the queue of pending requests
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Role handed to a request that needs a new access token
pub enum RefreshTicket<'a> {
    /// Caller must perform the refresh and settle the guard
    Leader(RefreshGuard<'a>),

    /// A refresh is already running; wait for its outcome
    Follower(PendingRefresh),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh or join the one in flight
    ///
    /// The flag check, the flag set and the enqueue happen under one lock.
    pub fn begin(&self) -> RefreshTicket<'_> {
        let mut state = self.lock();

        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.pending.push_back(tx);
            tracing::debug!(
                queued = state.pending.len(),
                "Refresh in progress, queued request"
            );
            return RefreshTicket::Follower(PendingRefresh { rx });
        }

        state.refreshing = true;
        RefreshTicket::Leader(RefreshGuard {
            coordinator: self,
            settled: false,
        })
    }

    /// Whether a refresh call is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Clear the flag and drain the queue, then notify in FIFO order
    fn finish(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.pending)
        };

        if !waiters.is_empty() {
            tracing::debug!(
                waiters = waiters.len(),
                success = outcome.is_ok(),
                "Settling queued requests"
            );
        }

        for waiter in waiters {
            // Receiver gone means that caller was dropped; nothing to deliver
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Held by the request performing the refresh
///
/// Dropping it unsettled clears the flag and rejects the queue with
/// [`RefreshError::Abandoned`].
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Publish the refresh outcome to every queued request
    pub fn settle(mut self, outcome: &RefreshOutcome) {
        self.settled = true;
        self.coordinator.finish(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Refresh dropped before settling, releasing queued requests");
            self.coordinator.finish(&Err(RefreshError::Abandoned));
        }
    }
}

/// A request suspended behind an in-flight refresh
pub struct PendingRefresh {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl PendingRefresh {
    /// Wait for the new access token, at most `bound`
    pub async fn wait(self, bound: Duration) -> Result<String, NetworkError> {
        match tokio::time::timeout(bound, self.rx).await {
            Ok(Ok(Ok(token))) => Ok(token),
            Ok(Ok(Err(e))) => Err(NetworkError::RefreshFailed(e)),
            Ok(Err(_)) => Err(NetworkError::RefreshFailed(RefreshError::Abandoned)),
            Err(_) => Err(NetworkError::RefreshTimeout {
                waited_secs: bound.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn leader(coordinator: &RefreshCoordinator) -> RefreshGuard<'_> {
        match coordinator.begin() {
            RefreshTicket::Leader(guard) => guard,
            RefreshTicket::Follower(_) => panic!("expected to lead the refresh"),
        }
    }

    fn follower(coordinator: &RefreshCoordinator) -> PendingRefresh {
        match coordinator.begin() {
            RefreshTicket::Follower(pending) => pending,
            RefreshTicket::Leader(_) => panic!("expected to follow the refresh"),
        }
    }

    #[tokio::test]
    async fn test_first_caller_leads_others_follow() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        assert!(coordinator.is_refreshing());

        let a = follower(&coordinator);
        let b = follower(&coordinator);
        assert_eq!(coordinator.pending_len(), 2);

        guard.settle(&Ok("a2".to_string()));
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending_len(), 0);

        assert_eq!(a.wait(WAIT).await.unwrap(), "a2");
        assert_eq!(b.wait(WAIT).await.unwrap(), "a2");
    }

    #[tokio::test]
    async fn test_failure_fans_out_same_error() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let a = follower(&coordinator);
        let b = follower(&coordinator);

        let error = RefreshError::Rejected {
            status: 400,
            message: "token_not_valid".to_string(),
        };
        guard.settle(&Err(error.clone()));

        for pending in [a, b] {
            match pending.wait(WAIT).await {
                Err(NetworkError::RefreshFailed(e)) => assert_eq!(e, error),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_waiters() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let pending = follower(&coordinator);

        drop(guard);
        assert!(!coordinator.is_refreshing());

        match pending.wait(WAIT).await {
            Err(NetworkError::RefreshFailed(RefreshError::Abandoned)) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flag_resets_for_next_cycle() {
        let coordinator = RefreshCoordinator::new();
        leader(&coordinator).settle(&Err(RefreshError::MissingRefreshToken));

        // A later expiry starts a fresh cycle
        let guard = leader(&coordinator);
        guard.settle(&Ok("a3".to_string()));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_every_spawned_waiter_resolved() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let pending = follower(&coordinator);
                tokio::spawn(async move { pending.wait(WAIT).await })
            })
            .collect();
        assert_eq!(coordinator.pending_len(), 5);

        guard.settle(&Ok("a2".to_string()));
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "a2");
        }
    }

    #[tokio::test]
    async fn test_waiters_settled_in_arrival_order() {
        use std::sync::Arc;

        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let delivered = Arc::new(Mutex::new(Vec::new()));

        // Current-thread runtime: woken tasks run in wake order
        let handles: Vec<_> = (0..6)
            .map(|index| {
                let pending = follower(&coordinator);
                let delivered = delivered.clone();
                tokio::spawn(async move {
                    let outcome = pending.wait(WAIT).await;
                    delivered.lock().unwrap().push(index);
                    outcome
                })
            })
            .collect();

        // Let every follower park on its receiver
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert!(delivered.lock().unwrap().is_empty());

        guard.settle(&Err(RefreshError::MissingRefreshToken));
        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                Err(NetworkError::RefreshFailed(RefreshError::MissingRefreshToken))
            ));
        }
        assert_eq!(*delivered.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_wait_is_bounded() {
        let coordinator = RefreshCoordinator::new();
        let _guard = leader(&coordinator);
        let pending = follower(&coordinator);

        match pending.wait(Duration::from_millis(20)).await {
            Err(NetworkError::RefreshTimeout { .. }) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
