//! Domain event bus and durable audit persistence.
//!
//! The admission engine publishes a [`DomainEvent`] for every state
//! transition it applies (session opened, student admitted, break/return,
//! anomalies, closures). Subscribers fan out independently; the bundled
//! [`EventPersistence`] service writes every event to the `events` table.

pub mod bus;
pub mod persistence;

pub use bus::{DomainEvent, EventBus};
pub use persistence::EventPersistence;
