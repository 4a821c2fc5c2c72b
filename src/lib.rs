//! IVI-style driver for Rohde & Schwarz SM-series RF signal generators.
//!
//! The crate exposes one generic driver, [`SmDriver`], whose behavior is
//! driven by a declarative attribute table rather than per-attribute code.
//! Capability traits in [`traits`] give typed access to the RF output, the
//! LF generator, IQ modulation, the ARB generator and mass memory.
//!
//! Instruments are reached through an [`InstrumentSession`]: either a VISA
//! resource (feature `instrument_visa`) or the in-memory [`SimulatedSession`].

pub mod attribute;
pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod model;
pub mod scpi;
pub mod session;
pub mod traits;

pub use attribute::{Attribute, AttributeValue};
pub use driver::{DriverOptions, DriverState, SmDriver};
pub use error::{DriverError, DriverResult};
pub use model::InstrumentModel;
pub use session::{InstrumentSession, SimulatedSession};
