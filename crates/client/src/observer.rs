//! Listener registry shared by the stores.
//!
//! Stores own a [`Listeners`] list and call every listener once a mutation has
//! fully settled. Listeners are identified by the [`SubscriptionId`] handed out
//! on subscription so views can detach when they go away.

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered list of boxed listeners of type `L` (usually a `dyn FnMut(..)`).
pub struct Listeners<L: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<L>)>,
}

impl<L: ?Sized> Listeners<L> {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn add(&mut self, listener: Box<L>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Number of active listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mutable access to every listener, in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<L>> {
        self.entries.iter_mut().map(|(_, listener)| listener)
    }
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> std::fmt::Debug for Listeners<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Listener = dyn FnMut(u32) -> u32;

    #[test]
    fn test_add_remove_in_order() {
        let mut listeners: Listeners<Listener> = Listeners::new();
        let first = listeners.add(Box::new(|n| n + 1));
        let second = listeners.add(Box::new(|n| n * 10));
        assert_ne!(first, second);
        assert_eq!(listeners.len(), 2);

        let results: Vec<u32> = listeners.iter_mut().map(|l| l(2)).collect();
        assert_eq!(results, vec![3, 20]);

        assert!(listeners.remove(first));
        assert!(!listeners.remove(first));
        let results: Vec<u32> = listeners.iter_mut().map(|l| l(2)).collect();
        assert_eq!(results, vec![20]);
    }
}
