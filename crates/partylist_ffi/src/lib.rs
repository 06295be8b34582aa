//! Flutter-facing bindings for PartyList core.

pub mod api;
