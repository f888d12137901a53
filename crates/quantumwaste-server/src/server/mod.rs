//! HTTP surface of the service: shared state, the router and the handlers behind it.

mod routes;
mod state;

pub use routes::router;
pub use state::AppState;
