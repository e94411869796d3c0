//! Integration tests
//!
//! `workflow` drives the services directly and `api` goes through the router,
//! both over the in-memory store. `postgres` needs a live database and is
//! ignored by default.

mod common;
mod workflow;
