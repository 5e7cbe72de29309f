//! Single-owner state cells with change subscriptions.
//!
//! An [`Observable`] holds the current value of one piece of engine state.
//! The owner publishes with [`Observable::set`]; readers either snapshot with
//! [`Observable::get`] or register a callback with [`Observable::subscribe`].
//!
//! Everything here is single-threaded (`Rc`/`RefCell`): state changes happen
//! on the same logical thread that processes samples.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Inner<T> {
    value: T,
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
}

/// A value with push notifications on every publish.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value: initial,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns a snapshot of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Replaces the value and notifies subscribers in subscription order.
    ///
    /// A listener that is still running (it published back into the same
    /// observable) is skipped for the nested notification.
    pub fn set(&self, value: T) {
        let listeners: Vec<Listener<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value.clone();
            inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
        };
        for listener in listeners {
            if let Ok(mut callback) = listener.try_borrow_mut() {
                (&mut *callback)(&value);
            }
        }
    }

    /// Registers a callback invoked on every subsequent publish.
    ///
    /// The current value is not replayed; call [`get`](Self::get) for that.
    /// Dropping the returned handle unsubscribes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let listener: Listener<T> = Rc::new(RefCell::new(callback));
            inner.listeners.push((id, listener));
            id
        };

        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("subscribers", &inner.listeners.len())
            .finish()
    }
}

/// Handle returned by [`Observable::subscribe`].
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Stops receiving notifications.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Keeps the callback registered for the observable's whole lifetime.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
