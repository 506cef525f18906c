//! Switchyard - WebSocket and static file server
//!
//! A single-task server that either upgrades an incoming connection to a
//! WebSocket channel or answers it with a file from a content directory.

pub mod config;
pub mod http;
pub mod server;
pub mod ws;
