//! Route handlers, grouped by who may call them.
//!
//! `system` and the join/login half of `auth` are public; everything in
//! `crud` plus `auth::me` and `auth::logout` sit behind the session layer.

pub mod auth;
pub mod crud;
pub mod system;
