//! Single owner of the variable table.
//!
//! The [`Store`] holds the current [`VariableTable`], runs every change
//! through [`reduce`], and publishes each new table to subscribers. A
//! subscriber holds only a [`Subscription`] handle; dropping it (or calling
//! [`Subscription::unsubscribe`]) stops delivery.
//!
//! Subscribers are notified only when a dispatch produces a new table. A
//! rejected action or an identity transition notifies nobody.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::variables::{
    Action, StoreError, StoreResult, Value, Variable, VariableTable, reduce,
};

type Callback = Rc<RefCell<dyn FnMut(&VariableTable)>>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

impl Subscribers {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(sid, _)| *sid == id)
    }
}

/// Handle for a store subscription.
#[must_use = "dropping a subscription unsubscribes it"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<RefCell<Subscribers>>,
}

impl Subscription {
    /// Stop receiving updates.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn detach(&self) {
        if let Some(subs) = self.subscribers.upgrade() {
            subs.borrow_mut().entries.retain(|(sid, _)| *sid != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

/// The variable store.
pub struct Store {
    table: VariableTable,
    subscribers: Rc<RefCell<Subscribers>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A store with an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(VariableTable::new())
    }

    /// A store starting from an existing table.
    #[must_use]
    pub fn with_table(table: VariableTable) -> Self {
        Self { table, subscribers: Rc::new(RefCell::new(Subscribers::default())) }
    }

    /// Snapshot of the current table.
    #[must_use]
    pub fn state(&self) -> VariableTable {
        self.table.clone()
    }

    /// Look up a variable by scope and name.
    #[must_use]
    pub fn find(&self, scope: &str, name: &str) -> Option<&Variable> {
        self.table.find(scope, name).map(|v| v.as_ref())
    }

    /// Apply one action.
    ///
    /// On error the store is unchanged and no subscriber is called.
    pub fn dispatch(&mut self, action: Action) -> StoreResult<()> {
        let next = reduce(&self.table, &action).inspect_err(|e| {
            warn!(action = action.kind(), error = %e, "action rejected");
        })?;
        debug!(action = action.kind(), "action applied");
        self.publish(next);
        Ok(())
    }

    /// Write several literal variables of `scope` at once, addressed by name.
    ///
    /// All updates apply or none do; subscribers see a single change.
    pub fn dispatch_updates(
        &mut self,
        scope: &str,
        updates: &BTreeMap<String, Value>,
    ) -> StoreResult<()> {
        let mut next = self.table.clone();
        for (name, value) in updates {
            let id = next
                .find(scope, name)
                .map(|v| v.id.clone())
                .ok_or_else(|| StoreError::NotFound(format!("{scope}.{name}")))
                .inspect_err(|e| warn!(error = %e, "bulk update rejected"))?;
            next = reduce(&next, &Action::UpdateValue { id, value: value.clone() })
                .inspect_err(|e| warn!(error = %e, "bulk update rejected"))?;
        }
        debug!(scope, count = updates.len(), "bulk update applied");
        self.publish(next);
        Ok(())
    }

    /// Register `callback` to receive every new table.
    #[must_use]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&VariableTable) + 'static,
    {
        let mut subs = self.subscribers.borrow_mut();
        let id = subs.next_id;
        subs.next_id += 1;
        let callback: Callback = Rc::new(RefCell::new(callback));
        subs.entries.push((id, callback));
        Subscription { id, subscribers: Rc::downgrade(&self.subscribers) }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }

    fn publish(&mut self, next: VariableTable) {
        if next.ptr_eq(&self.table) {
            return;
        }
        self.table = next;
        self.notify();
    }

    fn notify(&self) {
        let snapshot: Vec<(u64, Callback)> = self
            .subscribers
            .borrow()
            .entries
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            // An earlier callback may have dropped this subscription.
            if !self.subscribers.borrow().contains(id) {
                continue;
            }
            if let Ok(mut f) = callback.try_borrow_mut() {
                (&mut *f)(&self.table);
            }
        }
    }
}
