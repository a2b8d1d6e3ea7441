//! Per-tenant memoization of expense rows.
//!
//! Expense rows are fetched once per tenant and kept for the life of the
//! process. The cache never refreshes itself: whichever path mutates a
//! tenant's expenses must call [`ExpenseCache::invalidate`] before the next
//! price computation, or that computation runs on the stale snapshot. That
//! contract is deliberate and covered by tests.
//!
//! Each tenant gets its own async slot under the map lock, so two
//! computations for one tenant cannot both miss and fetch (single flight),
//! and a read cannot observe a half-written snapshot while an invalidation
//! races it.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::{ResultEngine, expenses::Expense};

type Slot = Arc<AsyncMutex<Option<Arc<Vec<Expense>>>>>;

/// Cache of expense rows keyed by tenant id.
#[derive(Debug, Default)]
pub struct ExpenseCache {
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl ExpenseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, tenant_id: Uuid) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slots.entry(tenant_id).or_default().clone()
    }

    /// Returns the tenant's cached rows, running `load` on the first access
    /// after creation or invalidation. A failing load leaves the slot empty,
    /// so the next access retries.
    pub async fn get_or_load<F, Fut>(
        &self,
        tenant_id: Uuid,
        load: F,
    ) -> ResultEngine<Arc<Vec<Expense>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResultEngine<Vec<Expense>>>,
    {
        let slot = self.slot(tenant_id);
        let mut guard = slot.lock().await;
        if let Some(rows) = guard.as_ref() {
            return Ok(Arc::clone(rows));
        }
        let rows = Arc::new(load().await?);
        *guard = Some(Arc::clone(&rows));
        Ok(rows)
    }

    /// Drops the tenant's snapshot; the next computation refetches.
    pub fn invalidate(&self, tenant_id: Uuid) {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slots.remove(&tenant_id);
    }
}
