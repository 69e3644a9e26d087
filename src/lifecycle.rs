//! One-shot window lifecycle signals.
//!
//! Every window carries a created and a destroyed signal. The resolver side
//! is held by the module registry and fired exactly once from the window
//! service's lifecycle notifications; the signal side is cloned freely and
//! awaited by whoever needs the window to exist (or to be gone) before
//! proceeding. Signals cannot be re-armed: resolving twice is a no-op.

use tokio::sync::watch;

/// Create a linked resolver/signal pair.
pub fn lifecycle() -> (LifecycleResolver, LifecycleSignal) {
    let (tx, rx) = watch::channel(false);
    (LifecycleResolver { tx }, LifecycleSignal { rx })
}

/// Firing side of a lifecycle signal.
#[derive(Debug)]
pub struct LifecycleResolver {
    tx: watch::Sender<bool>,
}

impl LifecycleResolver {
    pub fn resolve(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_resolved(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Waiting side of a lifecycle signal. Cheap to clone; any number of
/// waiters may await the same signal.
#[derive(Clone, Debug)]
pub struct LifecycleSignal {
    rx: watch::Receiver<bool>,
}

impl LifecycleSignal {
    /// Wait until the signal resolves. Returns immediately if it already
    /// has. A resolver dropped without firing counts as resolved so that
    /// teardown of a half-constructed window cannot wedge its waiters.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|resolved| *resolved).await;
    }

    pub fn is_resolved(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_after_resolve() {
        let (resolver, signal) = lifecycle();
        assert!(!signal.is_resolved());
        resolver.resolve();
        signal.wait().await;
        assert!(signal.is_resolved());
    }

    #[tokio::test]
    async fn resolving_twice_is_a_noop() {
        let (resolver, signal) = lifecycle();
        resolver.resolve();
        resolver.resolve();
        signal.wait().await;
    }

    #[tokio::test]
    async fn clones_observe_the_same_resolution() {
        let (resolver, signal) = lifecycle();
        let other = signal.clone();
        resolver.resolve();
        signal.wait().await;
        other.wait().await;
    }

    #[tokio::test]
    async fn dropped_resolver_unblocks_waiters() {
        let (resolver, signal) = lifecycle();
        drop(resolver);
        signal.wait().await;
    }
}
