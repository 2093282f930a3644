//! Typed listener registry used by the area controllers
//!
//! Listeners are registered per notification kind and called in
//! registration order. The registry is a cheap `Rc` handle, so a listener
//! may hold a clone and add or remove listeners while a notification is
//! being delivered. A listener removed mid-delivery is not called for the
//! remainder of that delivery.

use log::warn;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

/// A notification that can be dispatched by kind
pub trait Event: Clone + 'static {
    type Kind: Copy + Eq + Debug + 'static;

    fn kind(&self) -> Self::Kind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Registration<E: Event> {
    id: ListenerId,
    kind: E::Kind,
    listener: Listener<E>,
}

struct Registry<E: Event> {
    next_id: u64,
    registrations: Vec<Registration<E>>,
}

pub struct EventEmitter<E: Event> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: Event> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                registrations: Vec::new(),
            })),
        }
    }

    pub fn add_listener(&self, kind: E::Kind, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.registrations.push(Registration {
            id,
            kind,
            listener: Rc::new(RefCell::new(listener)),
        });
        id
    }

    /// Returns false if the listener was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.registrations.len();
        registry.registrations.retain(|registration| registration.id != id);
        registry.registrations.len() != before
    }

    pub fn remove_all_listeners(&self, kind: E::Kind) {
        self.registry
            .borrow_mut()
            .registrations
            .retain(|registration| registration.kind != kind);
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.registry
            .borrow()
            .registrations
            .iter()
            .filter(|registration| registration.kind == kind)
            .count()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.registry
            .borrow()
            .registrations
            .iter()
            .any(|registration| registration.id == id)
    }

    /// Delivers `event` to every listener of its kind, returning how many ran
    pub fn emit(&self, event: &E) -> usize {
        let kind = event.kind();
        let targets: Vec<(ListenerId, Listener<E>)> = self
            .registry
            .borrow()
            .registrations
            .iter()
            .filter(|registration| registration.kind == kind)
            .map(|registration| (registration.id, Rc::clone(&registration.listener)))
            .collect();

        let mut delivered = 0;
        for (id, listener) in targets {
            if !self.is_registered(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    (&mut *listener)(event);
                    delivered += 1;
                }
                Err(_) => warn!("Skipping re-entrant delivery of {:?}", kind),
            }
        }
        delivered
    }
}
