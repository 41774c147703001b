use crate::models::{EventKind, Record};
use crate::storage::{Storage, StorageError};
use futures_util::stream::{Stream, StreamExt};
use grid_types::grid::{
    map_server_server::{MapServer, MapServerServer},
    EventKind as ProtoEventKind, GetRequest, GetResponse, MapEvent, PutRequest, PutResponse,
    RemoveRequest, RemoveResponse, SubscribeRequest, ValueRecord, ValuesRequest,
};
use std::pin::Pin;
use std::sync::Arc;
use tonic::{Request, Response, Status};

#[derive(Clone)]
pub struct MapServiceImpl {
    storage: Arc<Storage>,
}

impl MapServiceImpl {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

type ValuesStream = Pin<Box<dyn Stream<Item = Result<ValueRecord, Status>> + Send>>;
type SubscribeStream = Pin<Box<dyn Stream<Item = Result<MapEvent, Status>> + Send>>;

fn require_map(map: &str) -> Result<(), Status> {
    if map.is_empty() {
        return Err(Status::invalid_argument("map name must not be empty"));
    }
    Ok(())
}

impl From<StorageError> for Status {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "storage failure");
        Status::internal(err.to_string())
    }
}

impl From<Record> for MapEvent {
    fn from(record: Record) -> Self {
        let kind = match record.kind {
            EventKind::Inserted => ProtoEventKind::Inserted,
            EventKind::Updated => ProtoEventKind::Updated,
            EventKind::Deleted => ProtoEventKind::Deleted,
        };
        MapEvent {
            ordinal: record.ordinal,
            map: record.map,
            kind: kind as i32,
            key: record.key,
            new_value: record.new_value,
            old_value: record.old_value,
            timestamp: record.timestamp,
        }
    }
}

#[tonic::async_trait]
impl MapServer for MapServiceImpl {
    type ValuesStream = ValuesStream;
    type SubscribeStream = SubscribeStream;

    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let req = request.into_inner();
        require_map(&req.map)?;

        let value = self.storage.get(&req.map, &req.key)?;
        Ok(Response::new(GetResponse { value }))
    }

    async fn put(&self, request: Request<PutRequest>) -> Result<Response<PutResponse>, Status> {
        let req = request.into_inner();
        require_map(&req.map)?;

        let previous = self.storage.put(&req.map, req.key, req.value)?;
        Ok(Response::new(PutResponse { previous }))
    }

    async fn remove(
        &self,
        request: Request<RemoveRequest>,
    ) -> Result<Response<RemoveResponse>, Status> {
        let req = request.into_inner();
        require_map(&req.map)?;

        let previous = self.storage.remove(&req.map, &req.key)?;
        Ok(Response::new(RemoveResponse { previous }))
    }

    async fn values(
        &self,
        request: Request<ValuesRequest>,
    ) -> Result<Response<Self::ValuesStream>, Status> {
        let req = request.into_inner();
        require_map(&req.map)?;

        let values = self.storage.values(&req.map)?;
        let output = async_stream::stream! {
            for value in values {
                yield Ok(ValueRecord { value });
            }
        };

        Ok(Response::new(Box::pin(output)))
    }

    async fn subscribe(
        &self,
        request: Request<SubscribeRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let req = request.into_inner();
        require_map(&req.map)?;

        tracing::debug!(map = %req.map, "new event subscription");
        let records = self.storage.subscribe(&req.map);
        let output = records.map(|record| Ok(MapEvent::from(record)));

        Ok(Response::new(Box::pin(output)))
    }
}

pub fn create_server(storage: Arc<Storage>) -> MapServerServer<MapServiceImpl> {
    MapServerServer::new(MapServiceImpl::new(storage))
}
