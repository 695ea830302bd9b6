//! Registration storage shared by the observer lists
//!
//! Observers are held weakly: a list never keeps an observer alive, it only
//! remembers it. Identity is the observer's address, so two equal-looking
//! observers are still two registrations.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Insertion-ordered, de-duplicated set of weakly held observers
pub struct ObserverSet<C: ?Sized> {
    entries: Mutex<Vec<Weak<C>>>,
}

impl<C: ?Sized> ObserverSet<C> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer at the end of the delivery order
    ///
    /// Returns `false` if it was already registered.
    pub fn add(&self, observer: &Arc<C>) -> bool {
        let mut entries = self.entries.lock();
        entries.retain(|w| w.strong_count() > 0);

        let ptr = Arc::as_ptr(observer);
        if entries.iter().any(|w| std::ptr::addr_eq(w.as_ptr(), ptr)) {
            return false;
        }

        entries.push(Arc::downgrade(observer));
        true
    }

    /// Unregister an observer
    ///
    /// Only the address of `observer` is compared, so any reference to the
    /// registered value works, including a shorter-lived trait object.
    /// Returns `false` if it was not registered.
    pub fn remove<O: ?Sized>(&self, observer: &O) -> bool {
        let mut entries = self.entries.lock();
        entries.retain(|w| w.strong_count() > 0);

        let ptr = observer as *const O;
        match entries.iter().position(|w| std::ptr::addr_eq(w.as_ptr(), ptr)) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether the observer is currently registered
    pub fn contains<O: ?Sized>(&self, observer: &O) -> bool {
        let ptr = observer as *const O;
        self.entries
            .lock()
            .iter()
            .any(|w| w.strong_count() > 0 && std::ptr::addr_eq(w.as_ptr(), ptr))
    }

    /// Number of registered observers that are still alive
    pub fn len(&self) -> usize {
        self.entries.lock().iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the delivery list for one event
    ///
    /// The lock is released before this returns, so observers may register
    /// or unregister while the snapshot is being delivered; those changes
    /// apply from the next snapshot on.
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        self.entries.lock().iter().filter_map(Weak::upgrade).collect()
    }

    /// Deliver one event to every observer in the current snapshot
    pub fn notify<F>(&self, mut deliver: F)
    where
        F: FnMut(&C),
    {
        for observer in self.snapshot() {
            deliver(&observer);
        }
    }
}

impl<C: ?Sized> Default for ObserverSet<C> {
    fn default() -> Self {
        Self::new()
    }
}
