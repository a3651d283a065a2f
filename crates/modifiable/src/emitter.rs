//! Minimal synchronous publish/subscribe.
//!
//! Listeners are registered per event kind and invoked in registration order.
//! No registry borrow is held while a listener runs, so listeners may
//! subscribe, unsubscribe or emit from inside a callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// An event that can be routed by kind.
pub trait Event {
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct Entry<E: Event> {
    id: u64,
    kind: E::Kind,
    listener: Listener<E>,
}

struct Registry<E: Event> {
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E: Event> Registry<E> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }
}

/// Listener registry for events of type `E`.
pub struct Emitter<E: Event> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: Event> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<E: Event + 'static> Emitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind`.
    pub fn on(&self, kind: E::Kind, listener: impl Fn(&E) + 'static) -> Unsubscribe {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry {
                id,
                kind,
                listener: Rc::new(listener),
            });
            id
        };

        let registry: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        Unsubscribe::new(move || {
            let Some(registry) = registry.upgrade() else {
                return false;
            };
            let removed = registry.borrow_mut().remove(id);
            removed
        })
    }

    /// Deliver `event` to every listener registered for its kind.
    ///
    /// The listener list is snapshotted up front; a listener removed during
    /// this emission is skipped, one added during it is not invoked.
    pub fn emit(&self, event: &E) {
        let kind = event.kind();
        let snapshot: Vec<(u64, Listener<E>)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.id, Rc::clone(&e.listener)))
            .collect();

        for (id, listener) in snapshot {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub fn clear(&self) {
        self.registry.borrow_mut().entries.clear();
    }
}

impl<E: Event> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("Emitter")
            .field("listeners", &registry.entries.len())
            .finish()
    }
}

/// Handle that removes a listener.
///
/// Dropping the handle does not unsubscribe; call [`Unsubscribe::unsubscribe`].
#[must_use = "dropping the handle keeps the listener registered"]
pub struct Unsubscribe(Box<dyn FnOnce() -> bool>);

impl Unsubscribe {
    pub(crate) fn new(f: impl FnOnce() -> bool + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Remove the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}
