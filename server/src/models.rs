use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Inserted,
    Updated,
    Deleted,
}

/// A change to one entry of a named map, numbered by the storage-wide
/// ordinal.
#[derive(Debug, Clone)]
pub struct Record {
    pub ordinal: u64,
    pub map: String,
    pub kind: EventKind,
    pub key: Vec<u8>,
    pub new_value: Option<Vec<u8>>,
    pub old_value: Option<Vec<u8>>,
    pub timestamp: i64,
}

impl Record {
    pub fn new(
        ordinal: u64,
        map: String,
        kind: EventKind,
        key: Vec<u8>,
        new_value: Option<Vec<u8>>,
        old_value: Option<Vec<u8>>,
    ) -> Self {
        Self {
            ordinal,
            map,
            kind,
            key,
            new_value,
            old_value,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
