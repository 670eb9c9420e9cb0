//! Bhumi MCU Library
//!
//! Traits the tracked-device firmware consumes from its surroundings.
//!
//! This crate provides:
//! - Access levels and the access policy deciding who may overwrite a registration
//! - The outbound event type and the sink that mesh/local dispatch goes through
//!
//! # Note
//! This crate has no dependencies besides `bhumi-proto`. MCU implementations
//! back `EventSink` with their mesh stack and event bus.

pub mod access;
pub mod events;

pub use access::*;
pub use events::*;
