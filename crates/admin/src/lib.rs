//! Trekbase back office library.
//!
//! Owns the local mirror of editable trip content, the admin session and
//! access gate derived from it, the client for the hosted remote store, and
//! the routine that migrates mirror trips into that store. The binary in
//! `main.rs` serves all of it over HTTP; `trekbase-cli` drives the same
//! pieces from the command line.
//!
//! # Security
//!
//! The admin flag lives in the mirror and is trusted as-is. Only deploy
//! behind a network boundary that already restricts who can reach the
//! service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod migration;
pub mod mirror;
pub mod remote;
pub mod routes;
pub mod session;
pub mod state;
