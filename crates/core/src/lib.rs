//! Domain logic for the rollcall attendance service.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the API server, and any future CLI tooling. All
//! functions here are pure: wall-clock time and policy settings are
//! always passed in explicitly, never read from ambient state.

pub mod admission;
pub mod error;
pub mod policy;
pub mod schedule;
pub mod session;
pub mod types;
