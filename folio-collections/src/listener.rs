/// Notification sent to list listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    /// A fetched page overlapped cached content; the cache was invalidated.
    Drift,
    /// New sort keys were applied; cached pages were dropped.
    Sorted,
    /// The cache and the memoized row count were cleared explicitly.
    Cleared,
    /// Pending changes were flushed to the backend.
    Committed,
}

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(ListEvent) + Send>;

/// Observer list with synchronous, in-order dispatch.
#[derive(Default)]
pub(crate) struct Listeners {
    next: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: impl FnMut(ListEvent) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn fire(&mut self, event: ListEvent) {
        tracing::trace!(?event, listeners = self.entries.len(), "notifying listeners");
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}
