//! Observer registry.
//!
//! Handlers subscribe either to every event or to one [`EventKind`], which
//! is indexed for lookup when an event is emitted. Handlers receive the
//! event by reference only, so they cannot reach back into the state that
//! emitted it.

use rustc_hash::FxHashMap;

use super::event::{EventKind, GameEvent};

/// Handle returned by `subscribe*`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Handler = Box<dyn FnMut(&GameEvent)>;

struct Listener {
    id: SubscriptionId,
    once: bool,
    handler: Handler,
}

/// Typed publish/subscribe registry.
#[derive(Default)]
pub struct EventBus {
    wildcard: Vec<Listener>,
    by_kind: FxHashMap<EventKind, Vec<Listener>>,
    next_id: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Receive every event.
    pub fn subscribe(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        let id = self.alloc_id();
        self.wildcard.push(Listener {
            id,
            once: false,
            handler: Box::new(handler),
        });
        id
    }

    /// Receive events of one kind.
    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.insert_kind(kind, Box::new(handler), false)
    }

    /// Receive the next event of one kind, then unsubscribe.
    pub fn subscribe_once(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.insert_kind(kind, Box::new(handler), true)
    }

    fn insert_kind(&mut self, kind: EventKind, handler: Handler, once: bool) -> SubscriptionId {
        let id = self.alloc_id();
        self.by_kind
            .entry(kind)
            .or_default()
            .push(Listener { id, once, handler });
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listener_total();
        self.wildcard.retain(|l| l.id != id);
        for listeners in self.by_kind.values_mut() {
            listeners.retain(|l| l.id != id);
        }
        self.by_kind.retain(|_, listeners| !listeners.is_empty());
        self.listener_total() != before
    }

    /// Deliver an event: catch-all handlers first, then kind handlers, each
    /// in subscription order.
    pub fn emit(&mut self, event: &GameEvent) {
        for listener in &mut self.wildcard {
            (listener.handler)(event);
        }

        let kind = event.kind();
        if let Some(listeners) = self.by_kind.get_mut(&kind) {
            for listener in listeners.iter_mut() {
                (listener.handler)(event);
            }
            listeners.retain(|l| !l.once);
            if listeners.is_empty() {
                self.by_kind.remove(&kind);
            }
        }
    }

    /// Number of handlers that would see an event of this kind.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.wildcard.len() + self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    fn listener_total(&self) -> usize {
        self.wildcard.len() + self.by_kind.values().map(Vec::len).sum::<usize>()
    }

    /// Drop the handlers for one kind, or all handlers.
    pub fn clear(&mut self, kind: Option<EventKind>) {
        match kind {
            Some(kind) => {
                self.by_kind.remove(&kind);
            }
            None => {
                self.wildcard.clear();
                self.by_kind.clear();
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("wildcard", &self.wildcard.len())
            .field("by_kind", &self.by_kind.len())
            .finish()
    }
}
