//! Instrument I/O sessions.
//!
//! The driver talks to the instrument only through [`InstrumentSession`].
//! Implementations handle the transport-specific details:
//!
//! - [`SimulatedSession`]: in-memory stand-in used for simulated operation and tests
//! - [`VisaSession`]: GPIB/USB/LAN instruments through a VISA library
//!   (`instrument_visa` feature)
//!
//! Transport failures are reported as `anyhow::Error` and reach the caller
//! unchanged through [`DriverError::Transport`](crate::error::DriverError::Transport).

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub mod simulated;
pub mod visa;

pub use simulated::{SessionEvent, SimulatedSession};
pub use visa::VisaSession;

/// Textual SCPI session to one instrument.
///
/// A session is exclusively owned by one driver; methods take `&mut self` so
/// at most one transaction is in flight at a time.
#[async_trait]
pub trait InstrumentSession: Send {
    /// Send one command; no response is read.
    async fn write(&mut self, command: &str) -> Result<()>;

    /// Send raw bytes, e.g. a block payload following `:MMEM:DATA`.
    async fn write_raw(&mut self, data: &[u8]) -> Result<()>;

    /// Send a query and read its text response.
    async fn ask(&mut self, query: &str) -> Result<String>;

    /// Clear the interface (device clear).
    async fn clear(&mut self) -> Result<()>;

    /// Release the session.
    async fn close(&mut self) -> Result<()>;

    /// Short description for logging.
    fn describe(&self) -> String;
}

/// Open a real transport for a VISA resource string.
pub async fn open_resource(
    resource: &str,
    timeout: Duration,
) -> crate::error::DriverResult<Box<dyn InstrumentSession>> {
    let session = VisaSession::open(resource, timeout).await?;
    Ok(Box::new(session))
}
