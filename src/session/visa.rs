//! VISA transport for GPIB/USB/Ethernet instruments.
//!
//! Wraps the `visa-rs` crate. VISA calls are blocking, so every transaction
//! runs on Tokio's blocking pool to keep the async runtime responsive.
//!
//! Supports resource strings like:
//! - "GPIB0::28::INSTR" (GPIB interface)
//! - "USB0::0x0AAD::0x005F::102345::INSTR" (USB)
//! - "TCPIP0::192.168.1.100::inst0::INSTR" (Ethernet/LXI)
//!
//! Without the `instrument_visa` feature, opening a session fails with
//! [`DriverError::FeatureNotEnabled`].

use super::InstrumentSession;
#[cfg(not(feature = "instrument_visa"))]
use crate::error::DriverError;
use crate::error::DriverResult;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

#[cfg(feature = "instrument_visa")]
use anyhow::{anyhow, Context};
#[cfg(feature = "instrument_visa")]
use std::sync::{Arc, Mutex};
#[cfg(feature = "instrument_visa")]
use tracing::debug;

/// Largest response returned by a single query.
#[cfg(feature = "instrument_visa")]
const READ_BUFFER_SIZE: usize = 4096;

/// Turn one VISA read into response text.
///
/// The read ends at the terminator or at EOI, whichever the instrument sends.
/// Invalid UTF-8 is replaced rather than rejected so malformed replies reach
/// the response parsers and their fallbacks.
#[cfg_attr(not(feature = "instrument_visa"), allow(dead_code))]
fn decode_response(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .trim_end_matches(['\n', '\r'])
        .trim()
        .to_string()
}

/// Session to a VISA resource.
pub struct VisaSession {
    resource: String,
    timeout: Duration,
    #[cfg(feature = "instrument_visa")]
    write_terminator: String,
    #[cfg(feature = "instrument_visa")]
    instrument: Option<Arc<Mutex<visa_rs::Instrument>>>,
}

impl VisaSession {
    /// The VISA resource string this session was opened on.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// I/O timeout applied to every transaction.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(feature = "instrument_visa")]
impl VisaSession {
    /// Open `resource` through the default VISA resource manager.
    pub async fn open(resource: &str, timeout: Duration) -> DriverResult<Self> {
        use std::ffi::CString;
        use visa_rs::prelude::*;

        let resource_name = resource.to_string();
        let instrument = tokio::task::spawn_blocking(move || {
            let rm = DefaultRM::new().context("Failed to create VISA resource manager")?;
            let c_string =
                CString::new(resource_name.as_str()).context("Invalid VISA resource string")?;
            let visa_string = visa_rs::VisaString::from(c_string);
            let instrument = rm
                .open(&visa_string, AccessMode::NO_LOCK, timeout)
                .with_context(|| format!("Failed to open VISA resource: {}", resource_name))?;
            Ok::<_, anyhow::Error>(instrument)
        })
        .await
        .context("VISA open task panicked")??;

        debug!("VISA resource '{}' opened", resource);
        Ok(Self {
            resource: resource.to_string(),
            timeout,
            write_terminator: "\n".to_string(),
            instrument: Some(Arc::new(Mutex::new(instrument))),
        })
    }

    fn handle(&self) -> Result<Arc<Mutex<visa_rs::Instrument>>> {
        self.instrument
            .clone()
            .ok_or_else(|| anyhow!("VISA session '{}' is closed", self.resource))
    }

    async fn send(&self, payload: Vec<u8>, label: String) -> Result<()> {
        use std::io::Write;

        let instrument = self.handle()?;
        tokio::task::spawn_blocking(move || {
            let guard = instrument
                .lock()
                .map_err(|_| anyhow!("VISA session lock poisoned"))?;
            (&*guard)
                .write_all(&payload)
                .with_context(|| format!("VISA write failed for: {}", label))?;
            Ok(())
        })
        .await
        .context("VISA write task panicked")?
    }
}

#[cfg(not(feature = "instrument_visa"))]
impl VisaSession {
    /// Always fails: VISA support was not compiled in.
    pub async fn open(resource: &str, timeout: Duration) -> DriverResult<Self> {
        let _ = (resource, timeout);
        Err(DriverError::FeatureNotEnabled("instrument_visa".to_string()))
    }
}

#[cfg(feature = "instrument_visa")]
#[async_trait]
impl InstrumentSession for VisaSession {
    async fn write(&mut self, command: &str) -> Result<()> {
        let payload = format!("{}{}", command, self.write_terminator).into_bytes();
        self.send(payload, command.to_string()).await?;
        debug!("VISA write sent: {}", command);
        Ok(())
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.send(data.to_vec(), format!("{} raw bytes", data.len()))
            .await
    }

    async fn ask(&mut self, query: &str) -> Result<String> {
        use std::io::{Read, Write};

        let instrument = self.handle()?;
        let command = format!("{}{}", query, self.write_terminator);
        let label = query.to_string();
        let response = tokio::task::spawn_blocking(move || {
            let guard = instrument
                .lock()
                .map_err(|_| anyhow!("VISA session lock poisoned"))?;
            (&*guard)
                .write_all(command.as_bytes())
                .with_context(|| format!("VISA query failed for: {}", label))?;
            let mut buf = [0u8; READ_BUFFER_SIZE];
            let n = (&*guard)
                .read(&mut buf)
                .with_context(|| format!("VISA read failed for: {}", label))?;
            Ok::<_, anyhow::Error>(decode_response(&buf[..n]))
        })
        .await
        .context("VISA query task panicked")??;

        debug!("VISA query '{}' -> '{}'", query, response);
        Ok(response)
    }

    async fn clear(&mut self) -> Result<()> {
        let instrument = self.handle()?;
        tokio::task::spawn_blocking(move || {
            let guard = instrument
                .lock()
                .map_err(|_| anyhow!("VISA session lock poisoned"))?;
            guard.clear().context("VISA device clear failed")?;
            Ok(())
        })
        .await
        .context("VISA clear task panicked")?
    }

    async fn close(&mut self) -> Result<()> {
        if self.instrument.take().is_some() {
            debug!("VISA resource '{}' closed", self.resource);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "VisaSession({} @ {}ms timeout)",
            self.resource,
            self.timeout.as_millis()
        )
    }
}

#[cfg(not(feature = "instrument_visa"))]
#[async_trait]
impl InstrumentSession for VisaSession {
    async fn write(&mut self, _command: &str) -> Result<()> {
        anyhow::bail!("VISA support not enabled. Rebuild with --features instrument_visa")
    }

    async fn write_raw(&mut self, _data: &[u8]) -> Result<()> {
        anyhow::bail!("VISA support not enabled. Rebuild with --features instrument_visa")
    }

    async fn ask(&mut self, _query: &str) -> Result<String> {
        anyhow::bail!("VISA support not enabled. Rebuild with --features instrument_visa")
    }

    async fn clear(&mut self) -> Result<()> {
        anyhow::bail!("VISA support not enabled. Rebuild with --features instrument_visa")
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        format!("VisaSession({}, disabled)", self.resource)
    }
}
