//! Background task delivering server events to a map's listeners.

use std::sync::Arc;

use futures_util::StreamExt;
use grid_types::grid::{EventKind, MapEvent as EventRecord};
use tonic::Streaming;

use crate::Error;
use crate::codec;
use crate::event::{MapEvent, MapEventType};
use crate::listeners::Listeners;
use crate::map::{MapKey, MapValue};

pub struct SyncTask<K, V> {
    map: String,
    stream: Streaming<EventRecord>,
    listeners: Arc<Listeners<K, V>>,
}

impl<K: MapKey, V: MapValue> SyncTask<K, V> {
    pub fn new(
        map: String,
        stream: Streaming<EventRecord>,
        listeners: Arc<Listeners<K, V>>,
    ) -> Self {
        Self {
            map,
            stream,
            listeners,
        }
    }

    /// Runs until the server closes the subscription or the stream fails.
    pub async fn run(mut self) -> Result<(), Error> {
        while let Some(result) = self.stream.next().await {
            let record = result?;
            let ordinal = record.ordinal;

            match self.process_record(record) {
                Ok(Some(event)) => self.listeners.dispatch(&event),
                Ok(None) => {
                    tracing::debug!(map = %self.map, ordinal, "skipping event of unknown kind");
                }
                Err(e) => {
                    tracing::warn!(map = %self.map, ordinal, error = %e, "failed to decode event");
                }
            }
        }

        Err(Error::ConnectionClosed)
    }

    fn process_record(&self, record: EventRecord) -> Result<Option<MapEvent<K, V>>, Error> {
        let kind = match record.kind() {
            EventKind::Inserted => MapEventType::Inserted,
            EventKind::Updated => MapEventType::Updated,
            EventKind::Deleted => MapEventType::Deleted,
            EventKind::Unspecified => return Ok(None),
        };

        let key: K = codec::decode(&record.key)?;
        let new_value = codec::decode_opt(record.new_value)?;
        let old_value = codec::decode_opt(record.old_value)?;

        Ok(Some(MapEvent::new(
            self.map.clone(),
            kind,
            key,
            new_value,
            old_value,
        )))
    }
}
