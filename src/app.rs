use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{create_customer, delete_customer, get_customer, list_customers},
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/{id}",
            get(get_customer).delete(delete_customer),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
