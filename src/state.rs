use std::sync::Arc;

use grid_map::NamedMap;

use crate::models::Customer;

/// Handles shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<dyn NamedMap<i64, Customer>>,
}

impl AppState {
    pub fn new(customers: Arc<dyn NamedMap<i64, Customer>>) -> Self {
        Self { customers }
    }
}
