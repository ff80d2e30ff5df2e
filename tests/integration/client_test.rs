//! Client integration tests
//!
//! Runs the real server on an ephemeral port and drives it with the
//! HTTP session store and the chat controller.

#![allow(dead_code)]

mod common;
mod scenarios;
