//! Structured logging vocabulary shared by every bridge component.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to
//! binaries and tests.

pub mod events;
pub mod fields;

#[cfg(test)]
pub(crate) mod log_capture;
