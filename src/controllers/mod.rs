pub mod health;
pub mod seats;
pub mod selections;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seats::routes())
        .merge(selections::routes())
}
