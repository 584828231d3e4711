//! Commands module - service layer for role lifecycle and reconciliation

mod lifecycle;
mod plan;
mod reconcile;
pub(crate) mod service;

pub use service::RoleService;
