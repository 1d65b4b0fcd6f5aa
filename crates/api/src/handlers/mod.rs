//! HTTP handler implementations for the admin surface.

pub mod devices;
pub mod policy;
pub mod sessions;
pub mod slots;
