//! Control-plane layer.
//!
//! Owns the route set built from discovery, its topic index, and the lazy
//! per-route activation triggered by downstream subscribers. Route state
//! transitions are serialized per route; nothing here takes a lock that spans
//! more than one route.

pub(crate) mod route_activation;
pub(crate) mod route_registry;
