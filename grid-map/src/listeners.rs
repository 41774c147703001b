//! Registry of listeners attached to one map.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::event::{MapEvent, MapListener};
use crate::filter::Filter;

/// Handle returned by `add_listener`, used to deregister the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration<K, V> {
    id: ListenerId,
    listener: Arc<dyn MapListener<K, V>>,
    filter: Option<Filter>,
}

impl<K, V> Clone for Registration<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            filter: self.filter.clone(),
        }
    }
}

pub(crate) struct Listeners<K, V> {
    next_id: AtomicU64,
    entries: RwLock<Vec<Registration<K, V>>>,
}

impl<K, V> Listeners<K, V> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, listener: Arc<dyn MapListener<K, V>>, filter: Option<Filter>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut guard) = self.entries.write() {
            guard.push(Registration {
                id,
                listener,
                filter,
            });
        }
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        match self.entries.write() {
            Ok(mut guard) => {
                let before = guard.len();
                guard.retain(|registration| registration.id != id);
                guard.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().map(|g| g.is_empty()).unwrap_or(true)
    }

    /// Delivers `event` to every listener whose filter accepts it.
    pub fn dispatch(&self, event: &MapEvent<K, V>)
    where
        V: Serialize,
    {
        // Callbacks run outside the lock so they may (de)register listeners.
        let registrations = match self.entries.read() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };

        for registration in registrations {
            let accepted = registration
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches_event(event));
            if accepted {
                event.dispatch_to(registration.listener.as_ref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::EventMask;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl MapListener<i64, f64> for Recorder {
        fn on_inserted(&self, event: &MapEvent<i64, f64>) {
            self.seen.lock().unwrap().push(format!("insert {}", event.key()));
        }

        fn on_deleted(&self, event: &MapEvent<i64, f64>) {
            self.seen.lock().unwrap().push(format!("delete {}", event.key()));
        }
    }

    #[test]
    fn dispatches_through_filters() {
        let listeners = Listeners::<i64, f64>::new();
        let all = Arc::new(Recorder::default());
        let deletes = Arc::new(Recorder::default());

        listeners.add(all.clone(), None);
        listeners.add(
            deletes.clone(),
            Some(Filter::event(Filter::always(), EventMask::DELETED)),
        );

        listeners.dispatch(&MapEvent::inserted("m", 1, 1.0));
        listeners.dispatch(&MapEvent::deleted("m", 1, 1.0));

        assert_eq!(*all.seen.lock().unwrap(), vec!["insert 1", "delete 1"]);
        assert_eq!(*deletes.seen.lock().unwrap(), vec!["delete 1"]);
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let listeners = Listeners::<i64, f64>::new();
        let recorder = Arc::new(Recorder::default());

        let id = listeners.add(recorder.clone(), None);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        assert!(listeners.is_empty());

        listeners.dispatch(&MapEvent::inserted("m", 1, 1.0));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
