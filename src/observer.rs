//! Synchronous observer registry.
//!
//! Every stateful component (module registry, keybind registry, each
//! module) exposes subscribe/unsubscribe/notify so presentation layers can
//! refresh on mutation. Notification is synchronous and runs on the event
//! loop thread; callbacks must not call back into a mutating registry
//! method outside the skip-notify convention.

use std::sync::Arc;

use parking_lot::Mutex;

/// Token returned by [`Subscribers::subscribe`]; pass it back to
/// [`Subscribers::unsubscribe`] to detach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct SubscriberList {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

/// A cloneable handle to one component's observer list.
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<Mutex<SubscriberList>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let mut list = self.inner.lock();
        let id = SubscriptionId(list.next_id);
        list.next_id += 1;
        list.callbacks.push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().callbacks.retain(|(sub, _)| *sub != id);
    }

    /// Invoke every registered callback. Callbacks run outside the internal
    /// lock, so a callback may subscribe or unsubscribe without deadlocking.
    pub fn notify(&self) {
        let callbacks: Vec<Callback> = self
            .inner
            .lock()
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn notify_reaches_every_subscriber() {
        let subs = Subscribers::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            subs.subscribe(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        subs.notify();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsubscribe_detaches_only_that_callback() {
        let subs = Subscribers::new();
        let count = Arc::new(AtomicUsize::new(0));
        let keep = {
            let count = Arc::clone(&count);
            subs.subscribe(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let drop_me = {
            let count = Arc::clone(&count);
            subs.subscribe(move || {
                count.fetch_add(10, Ordering::SeqCst);
            })
        };
        subs.unsubscribe(drop_me);
        subs.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        subs.unsubscribe(keep);
        subs.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_subscribe_during_notify() {
        let subs = Subscribers::new();
        let inner = subs.clone();
        subs.subscribe(move || {
            inner.subscribe(|| {});
        });
        subs.notify();
        assert_eq!(subs.len(), 2);
    }
}
