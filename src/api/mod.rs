//! HTTP surface over [`LocationVerifier`](crate::verification::LocationVerifier)

pub mod handlers;
pub mod routes;

pub use routes::create_router;
