//! Local notification contract consumed by the task store.
//!
//! # Responsibility
//! - Describe the narrow scheduler interface the platform plugin satisfies.
//! - Derive a stable notification slot from a task id.
//! - Provide an in-process outbox implementation hosts can drain.
//!
//! # Invariants
//! - Notification failures never abort a task mutation.
//! - One task id always maps to the same slot; distinct ids may collide.

pub mod outbox;
pub mod scheduler;
