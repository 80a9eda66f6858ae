pub mod client;
mod dto;
pub mod encoder;
pub mod handlers;
pub mod schema;
pub mod services;
pub mod session;
pub mod transport;
pub mod types;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
