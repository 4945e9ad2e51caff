//! Session, role cache and ownership adoption for Stockroom.
//!
//! [`SessionContext`] is the entry point: it owns a [`SessionManager`] (which
//! drives the [`ProfileCache`]), the member and manager [`RouteGuard`]s, and
//! the [`OwnershipAdoption`] capability shared by every record kind.

pub mod adoption;
pub mod cache;
pub mod config;
pub mod context;
pub mod guard;
pub mod manager;

pub use adoption::OwnershipAdoption;
pub use cache::ProfileCache;
pub use config::SessionConfig;
pub use context::SessionContext;
pub use guard::{GuardDecision, GuardOutcome, GuardPolicy, GuardRoutes, GuardState, RouteGuard};
pub use manager::SessionManager;

#[cfg(test)]
mod tests;
