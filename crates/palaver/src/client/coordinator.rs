//! Single-flight coordination of credential refreshes.
//!
//! When several requests find their access token rejected at once, only the
//! first one (the leader) calls the backend. Everyone else registers a
//! one-shot receiver and is woken with the leader's outcome. The waiter list
//! is drained under the same lock that returns the coordinator to idle, so no
//! waiter can register into a cycle that has already been fanned out.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::auth::AccessToken;
use crate::error::AuthError;

/// Result of one refresh cycle, shared by the leader and every waiter.
pub type RefreshOutcome = Result<AccessToken, AuthError>;

type Waiters = Vec<oneshot::Sender<RefreshOutcome>>;

/// Guards the refresh of one session's credentials.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    /// `None` while idle; the insertion-ordered waiters while refreshing.
    state: Mutex<Option<Waiters>>,
}

enum Role {
    Current(AccessToken),
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh cycle is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of callers suspended on the current cycle.
    pub fn waiter_count(&self) -> usize {
        self.lock().as_ref().map_or(0, Vec::len)
    }

    /// Obtain a usable access token after a 401.
    ///
    /// `fresher` is consulted only when no cycle is running; if it yields a
    /// token, a cycle that finished after the rejected request was sent has
    /// already replaced the credential, and that token is returned without
    /// another refresh. Otherwise the caller either leads a new cycle by
    /// running `refresh` or waits for the running one.
    pub async fn refresh<C, F, Fut>(&self, fresher: C, refresh: F) -> RefreshOutcome
    where
        C: FnOnce() -> Option<AccessToken>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let role = {
            let mut state = self.lock();
            match state.as_mut() {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    debug!(position = waiters.len(), "Waiting on in-flight refresh");
                    Role::Waiter(rx)
                }
                None => match fresher() {
                    Some(token) => Role::Current(token),
                    None => {
                        *state = Some(Vec::new());
                        Role::Leader
                    }
                },
            }
        };

        match role {
            Role::Current(token) => {
                debug!("Credential already refreshed");
                Ok(token)
            }
            Role::Waiter(rx) => rx.await.unwrap_or(Err(AuthError::RefreshAbandoned)),
            Role::Leader => {
                debug!("Starting refresh cycle");
                let cycle = Cycle {
                    coordinator: self,
                    finished: false,
                };
                let outcome = refresh().await;
                cycle.finish(outcome.clone());
                outcome
            }
        }
    }

    /// Return to idle and hand `outcome` to every waiter, in registration order.
    fn complete(&self, outcome: RefreshOutcome) {
        let waiters = self.lock().take().unwrap_or_default();
        debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Refresh cycle finished"
        );
        for waiter in waiters {
            // A waiter whose request was dropped no longer listens.
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Waiters>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Completes the cycle even when the leader's future is dropped mid-refresh.
struct Cycle<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl Cycle<'_> {
    fn finish(mut self, outcome: RefreshOutcome) {
        self.finished = true;
        self.coordinator.complete(outcome);
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Refresh leader dropped before completion");
            self.coordinator.complete(Err(AuthError::RefreshAbandoned));
        }
    }
}
