//! Data-plane layer.
//!
//! Opens the upstream consumer and downstream producers of a route and runs the
//! relay task that moves converted messages between them.

pub(crate) mod relay_worker;
pub(crate) mod route_activator;
