//! Change listeners attached to the `customers` map at startup.

use std::sync::Arc;

use grid_map::{EventMask, Filter, ListenerId, MapEvent, MapListener, NamedMap};

use crate::models::Customer;

/// Name of the map holding customer records.
pub const CUSTOMERS_MAP: &str = "customers";

/// Deleting a customer whose balance exceeds this is logged separately.
pub const LARGE_BALANCE_THRESHOLD: f64 = 5000.0;

/// Logs every insert, update and delete on the map.
pub struct CustomerEventLogger;

impl CustomerEventLogger {
    fn log(&self, event: &MapEvent<i64, Customer>) {
        tracing::info!(
            kind = %event.kind(),
            key = *event.key(),
            new = ?event.new_value(),
            old = ?event.old_value(),
            "customer event"
        );
    }
}

impl MapListener<i64, Customer> for CustomerEventLogger {
    fn on_inserted(&self, event: &MapEvent<i64, Customer>) {
        self.log(event);
    }

    fn on_updated(&self, event: &MapEvent<i64, Customer>) {
        self.log(event);
    }

    fn on_deleted(&self, event: &MapEvent<i64, Customer>) {
        self.log(event);
    }
}

/// Logs deletions of large-balance customers. Meant to be registered with
/// [`large_balance_delete_filter`].
pub struct LargeBalanceDeleteLogger;

impl MapListener<i64, Customer> for LargeBalanceDeleteLogger {
    fn on_deleted(&self, event: &MapEvent<i64, Customer>) {
        tracing::info!(
            key = *event.key(),
            old = ?event.old_value(),
            "large balance customer deleted"
        );
    }
}

pub fn large_balance_delete_filter() -> Filter {
    Filter::event(
        Filter::greater("balance", LARGE_BALANCE_THRESHOLD),
        EventMask::DELETED,
    )
}

/// Ids of the listeners added by [`register_listeners`].
#[derive(Debug, Clone, Copy)]
pub struct ListenerRegistrations {
    pub all_events: ListenerId,
    pub large_deletes: ListenerId,
}

pub async fn register_listeners(
    customers: &dyn NamedMap<i64, Customer>,
) -> Result<ListenerRegistrations, grid_map::Error> {
    tracing::info!(map = customers.name(), "adding listeners");

    let all_events = customers
        .add_listener(Arc::new(CustomerEventLogger), None)
        .await?;
    let large_deletes = customers
        .add_listener(
            Arc::new(LargeBalanceDeleteLogger),
            Some(large_balance_delete_filter()),
        )
        .await?;

    Ok(ListenerRegistrations {
        all_events,
        large_deletes,
    })
}

impl ListenerRegistrations {
    pub async fn deregister(
        self,
        customers: &dyn NamedMap<i64, Customer>,
    ) -> Result<(), grid_map::Error> {
        customers.remove_listener(self.all_events).await?;
        customers.remove_listener(self.large_deletes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_delete_filter_uses_strict_threshold() {
        let filter = large_balance_delete_filter();

        let large = MapEvent::deleted(CUSTOMERS_MAP, 2, Customer::new(2, "Bob", 6000.0));
        let boundary = MapEvent::deleted(CUSTOMERS_MAP, 3, Customer::new(3, "Cy", 5000.0));
        let insert = MapEvent::inserted(CUSTOMERS_MAP, 2, Customer::new(2, "Bob", 6000.0));

        assert!(filter.matches_event(&large));
        assert!(!filter.matches_event(&boundary));
        assert!(!filter.matches_event(&insert));
    }
}
