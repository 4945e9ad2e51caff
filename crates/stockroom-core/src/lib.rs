//! Core types and trait definitions for the Stockroom session subsystem.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the role hierarchy, the profile and session data model, and the
//! narrow interfaces through which the identity provider, the data store and
//! the notification sink are consumed.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod notify;
pub mod profile;
pub mod provider;
pub mod record;
pub mod role;
pub mod session;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
