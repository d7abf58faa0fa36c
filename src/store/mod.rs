use dashmap::DashMap;
use uuid::Uuid;

use crate::models::bid::Bid;
use crate::models::order::Order;
use crate::models::payment::PaymentRecord;
use crate::models::user::User;

/// One keyed collection of documents. Each call is independently atomic;
/// nothing composes across calls, so multi-document updates must be
/// serialized by the caller (see `state::OrderLocks`).
pub struct Collection<T> {
    docs: DashMap<Uuid, T>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self { docs: DashMap::new() }
    }

    pub fn insert(&self, id: Uuid, doc: T) {
        self.docs.insert(id, doc);
    }

    pub fn find_one(&self, id: &Uuid) -> Option<T> {
        self.docs.get(id).map(|entry| entry.value().clone())
    }

    pub fn find_where<F>(&self, filter: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.docs
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn find_one_where<F>(&self, filter: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.docs
            .iter()
            .find(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
    }

    /// Applies `patch` to the document, returning the updated copy, or
    /// `None` if the id is unknown.
    pub fn update<F>(&self, id: &Uuid, patch: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        self.docs.get_mut(id).map(|mut entry| {
            patch(entry.value_mut());
            entry.value().clone()
        })
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.docs.remove(id).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The document store: orders, bids and users keyed by their own id,
/// payments keyed by *order* id — that key is the per-order unique
/// constraint backing settlement idempotency.
pub struct Store {
    pub orders: Collection<Order>,
    pub bids: Collection<Bid>,
    pub users: Collection<User>,
    pub payments: Collection<PaymentRecord>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            orders: Collection::new(),
            bids: Collection::new(),
            users: Collection::new(),
            payments: Collection::new(),
        }
    }

    /// The user owning the order, i.e. its receiver.
    pub fn receiver_of(&self, order_id: &Uuid) -> Option<User> {
        self.users.find_one_where(|user| user.orders.contains(order_id))
    }

    /// The user holding the bid, i.e. the courier who placed it.
    pub fn deliverer_of(&self, bid_id: &Uuid) -> Option<User> {
        self.users.find_one_where(|user| user.bids.contains(bid_id))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
