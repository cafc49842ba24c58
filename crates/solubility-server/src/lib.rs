//! Solubility Server - LogS prediction over HTTP
//!
//! The router and configuration live in the library so integration tests
//! can drive the real routes without binding a socket.

pub mod api;
pub mod config;
