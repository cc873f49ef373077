//! In-memory reference implementation of the task backend REST contract.

pub mod auth;
pub mod errors;
pub mod routes;
pub mod startup;
pub mod store;

pub use startup::{build_app, build_state, run, serve};
