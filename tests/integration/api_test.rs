//! API endpoint integration tests
//!
//! Drives the composed application router: chat turns, session
//! management and the Postgres repository.

#![allow(dead_code)]

mod chat;
mod common;
mod postgres;
mod sessions;
