//! Capability traits.
//!
//! Each trait groups the attributes of one IVI capability and exposes them
//! with native Rust types. They are implemented for [`SmDriver`](crate::driver::SmDriver)
//! on top of the generic accessor, so a model lacking a capability rejects the
//! call with `CapabilityNotSupported` before any I/O.

pub mod arb_generator;
pub mod lf_generator;
pub mod memory;
pub mod modulate_iq;
pub mod rf_base;

pub use arb_generator::{ArbGenerator, ArbTriggerSource};
pub use lf_generator::{LfGenerator, LfGeneratorOutput, LfWaveform};
pub use memory::MassMemory;
pub use modulate_iq::{IqSource, ModulateIq};
pub use rf_base::RfBase;
