//! Library surface of the gateway so integration tests can build the
//! real router with mock backends.

pub mod routes;

pub use routes::{app_router, AppState};
