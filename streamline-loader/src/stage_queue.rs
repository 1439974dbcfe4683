use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};

/// Tells a blocked [`StageQueue`] consumer to stop waiting. The flag is the source of truth, the
/// channel only exists to wake a consumer that is parked in `select!`.
pub struct ShutdownSignal {
    requested: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        ShutdownSignal {
            requested: AtomicBool::new(false),
            wake_tx,
            wake_rx,
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        // One token is enough to wake the consumer, a full channel means one is already pending
        let _ = self.wake_tx.try_send(());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        ShutdownSignal::new()
    }
}

/// Unbounded FIFO hand-off point between pipeline stages. Any number of threads may push, any
/// number may pop. Items come out in the order they were pushed.
///
/// Consumers either park until work arrives ([`pop_or_wait`](Self::pop_or_wait),
/// [`pop_all_or_wait`](Self::pop_all_or_wait)) or poll without ever blocking
/// ([`drain_nonblocking`](Self::drain_nonblocking)). No lock is held while the consumer works on
/// an item.
pub struct StageQueue<T> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> StageQueue<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        StageQueue { name, tx, rx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(
        &self,
        item: T,
    ) {
        // We hold the receiver, so the channel can't be disconnected
        let _ = self.tx.send(item);
    }

    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Blocks until an item is available or `shutdown` is requested. Returns `None` only on
    /// shutdown. An item that races with shutdown is dropped.
    pub fn pop_or_wait(
        &self,
        shutdown: &ShutdownSignal,
    ) -> Option<T> {
        if shutdown.is_requested() {
            return None;
        }

        crossbeam_channel::select! {
            recv(self.rx) -> msg => {
                if shutdown.is_requested() {
                    None
                } else {
                    msg.ok()
                }
            },
            recv(shutdown.wake_rx) -> _msg => None,
        }
    }

    /// Waits for at least one item, then hands items to `f` one at a time until the queue is
    /// empty or shutdown is requested. Returns false once shutdown has been requested.
    pub fn pop_all_or_wait<F: FnMut(T)>(
        &self,
        shutdown: &ShutdownSignal,
        mut f: F,
    ) -> bool {
        let first = match self.pop_or_wait(shutdown) {
            Some(item) => item,
            None => return false,
        };
        f(first);

        while !shutdown.is_requested() {
            match self.rx.try_recv() {
                Ok(item) => f(item),
                Err(_) => break,
            }
        }

        !shutdown.is_requested()
    }

    /// Yields whatever is queued right now and stops as soon as the queue is empty. Never blocks.
    /// Items not pulled from the iterator stay queued.
    pub fn drain_nonblocking(&self) -> crossbeam_channel::TryIter<'_, T> {
        self.rx.try_iter()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> std::fmt::Debug for StageQueue<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("StageQueue")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
