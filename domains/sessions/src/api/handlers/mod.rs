//! Sessions domain API handlers

pub mod chat;
pub mod sessions;
