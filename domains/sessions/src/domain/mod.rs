//! Domain layer for chat sessions

pub mod context;
pub mod entities;
