//! Predicates restricting which events reach a listener.

use std::ops::BitOr;

use serde::Serialize;
use serde_json::Value;

use crate::event::{MapEvent, MapEventType};

/// Set of event types a listener is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventMask(u8);

impl EventMask {
    pub const INSERTED: EventMask = EventMask(0b001);
    pub const UPDATED: EventMask = EventMask(0b010);
    pub const DELETED: EventMask = EventMask(0b100);
    pub const ALL: EventMask = EventMask(0b111);

    pub fn contains(self, kind: MapEventType) -> bool {
        let bit = match kind {
            MapEventType::Inserted => Self::INSERTED,
            MapEventType::Updated => Self::UPDATED,
            MapEventType::Deleted => Self::DELETED,
        };
        self.0 & bit.0 != 0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        EventMask(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

/// A predicate over map values, optionally restricted to event types.
///
/// Fields are addressed by name in the JSON form of the value; nested
/// fields use dotted paths (`"address.city"`).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Always,
    Compare {
        field: String,
        op: Comparison,
        value: f64,
    },
    Equal {
        field: String,
        value: Value,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Event {
        filter: Box<Filter>,
        mask: EventMask,
    },
}

impl Filter {
    pub fn always() -> Self {
        Filter::Always
    }

    pub fn greater(field: impl Into<String>, value: f64) -> Self {
        Self::compare(field, Comparison::Greater, value)
    }

    pub fn greater_equal(field: impl Into<String>, value: f64) -> Self {
        Self::compare(field, Comparison::GreaterEqual, value)
    }

    pub fn less(field: impl Into<String>, value: f64) -> Self {
        Self::compare(field, Comparison::Less, value)
    }

    pub fn less_equal(field: impl Into<String>, value: f64) -> Self {
        Self::compare(field, Comparison::LessEqual, value)
    }

    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Restricts `filter` to the event types in `mask`.
    pub fn event(filter: Filter, mask: EventMask) -> Self {
        Filter::Event {
            filter: Box::new(filter),
            mask,
        }
    }

    fn compare(field: impl Into<String>, op: Comparison, value: f64) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Evaluates the predicate against a single value.
    ///
    /// Event masks nested inside value combinators are ignored here.
    pub fn evaluate(&self, value: &Value) -> bool {
        match self {
            Filter::Always => true,
            Filter::Compare { field, op, value: rhs } => {
                match extract(value, field).and_then(Value::as_f64) {
                    Some(lhs) => match op {
                        Comparison::Greater => lhs > *rhs,
                        Comparison::GreaterEqual => lhs >= *rhs,
                        Comparison::Less => lhs < *rhs,
                        Comparison::LessEqual => lhs <= *rhs,
                    },
                    None => false,
                }
            }
            Filter::Equal { field, value: rhs } => extract(value, field) == Some(rhs),
            Filter::And(a, b) => a.evaluate(value) && b.evaluate(value),
            Filter::Or(a, b) => a.evaluate(value) || b.evaluate(value),
            Filter::Not(inner) => !inner.evaluate(value),
            Filter::Event { filter, .. } => filter.evaluate(value),
        }
    }

    /// Decides whether `event` should be delivered to a listener registered
    /// with this filter.
    ///
    /// Inserts are matched on the new value, deletes on the old value and
    /// updates on either. A filter without an event mask matches all kinds.
    pub fn matches_event<K, V: Serialize>(&self, event: &MapEvent<K, V>) -> bool {
        let (filter, mask) = match self {
            Filter::Event { filter, mask } => (filter.as_ref(), *mask),
            other => (other, EventMask::ALL),
        };
        if !mask.contains(event.kind()) {
            return false;
        }
        if *filter == Filter::Always {
            return true;
        }

        let matches = |value: Option<&V>| {
            value
                .and_then(|v| serde_json::to_value(v).ok())
                .is_some_and(|json| filter.evaluate(&json))
        };
        match event.kind() {
            MapEventType::Inserted => matches(event.new_value()),
            MapEventType::Deleted => matches(event.old_value()),
            MapEventType::Updated => matches(event.old_value()) || matches(event.new_value()),
        }
    }
}

fn extract<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| current.get(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Account {
        name: &'static str,
        balance: f64,
    }

    fn account(balance: f64) -> Account {
        Account {
            name: "acct",
            balance,
        }
    }

    #[test]
    fn compares_numeric_fields() {
        let value = json!({ "balance": 6000.0, "owner": { "age": 40 } });

        assert!(Filter::greater("balance", 5000.0).evaluate(&value));
        assert!(!Filter::less("balance", 5000.0).evaluate(&value));
        assert!(Filter::greater_equal("owner.age", 40.0).evaluate(&value));
        assert!(!Filter::greater("missing", 0.0).evaluate(&value));
    }

    #[test]
    fn combines_predicates() {
        let value = json!({ "name": "Bob", "balance": 10.0 });
        let filter = Filter::equal("name", "Bob").and(Filter::less_equal("balance", 10.0));

        assert!(filter.evaluate(&value));
        assert!(!filter.clone().not().evaluate(&value));
        assert!(Filter::equal("name", "Alice").or(filter).evaluate(&value));
    }

    #[test]
    fn event_filter_respects_mask_and_old_value() {
        let filter = Filter::event(Filter::greater("balance", 5000.0), EventMask::DELETED);

        let large = MapEvent::deleted("accounts", 2, account(6000.0));
        let small = MapEvent::deleted("accounts", 1, account(5000.0));
        let inserted = MapEvent::inserted("accounts", 2, account(6000.0));

        assert!(filter.matches_event(&large));
        assert!(!filter.matches_event(&small));
        assert!(!filter.matches_event(&inserted));
    }

    #[test]
    fn updates_match_on_either_value() {
        let filter = Filter::greater("balance", 100.0);
        let crossing = MapEvent::updated("accounts", 1, account(50.0), account(500.0));

        assert!(filter.matches_event(&crossing));
        assert!(
            Filter::event(Filter::always(), EventMask::INSERTED | EventMask::UPDATED)
                .matches_event(&crossing)
        );
    }
}
