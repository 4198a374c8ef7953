//! Flutter-facing bindings for tasklist core.

pub mod api;
