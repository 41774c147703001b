//! Wire contract shared by the map server and its clients.

pub mod grid {
    tonic::include_proto!("grid");
}
