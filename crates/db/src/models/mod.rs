//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod attendance;
pub mod device;
pub mod event;
pub mod person;
pub mod policy;
pub mod session;
pub mod slot;
