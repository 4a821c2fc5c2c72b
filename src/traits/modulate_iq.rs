//! IQ modulator.

use crate::attribute::{Attribute, IQ_SOURCES};
use crate::driver::SmDriver;
use crate::error::{DriverError, DriverResult};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Signal source feeding the IQ modulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IqSource {
    /// Analog I/Q inputs
    External,
    /// Baseband with the ARB generator running
    ArbGenerator,
    /// Baseband with digital modulation running
    DigitalModulationBase,
}

impl IqSource {
    /// Every IQ source.
    pub const ALL: [IqSource; 3] = [
        IqSource::External,
        IqSource::ArbGenerator,
        IqSource::DigitalModulationBase,
    ];

    /// Name accepted by the `iq_source` attribute.
    pub fn as_str(self) -> &'static str {
        IQ_SOURCES[self as usize]
    }
}

impl fmt::Display for IqSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IqSource {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IqSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| DriverError::ValueNotSupported {
                attribute: Attribute::IqSource.key().to_string(),
                value: s.to_string(),
            })
    }
}

/// IQ modulation capability.
#[async_trait]
pub trait ModulateIq: Send {
    /// Whether IQ modulation is on.
    async fn iq_enabled(&mut self) -> DriverResult<bool>;

    /// Switch IQ modulation on or off.
    async fn set_iq_enabled(&mut self, enabled: bool) -> DriverResult<()>;

    /// Last source written through this driver. There is no instrument query,
    /// so this fails with `NotCached` until a source has been set.
    async fn iq_source(&mut self) -> DriverResult<IqSource>;

    /// Switch the IQ source. Both baseband generators are turned off before
    /// the new source is selected.
    async fn set_iq_source(&mut self, source: IqSource) -> DriverResult<()>;
}

#[async_trait]
impl ModulateIq for SmDriver {
    async fn iq_enabled(&mut self) -> DriverResult<bool> {
        self.get_bool(Attribute::IqEnabled).await
    }

    async fn set_iq_enabled(&mut self, enabled: bool) -> DriverResult<()> {
        self.set(Attribute::IqEnabled, enabled).await
    }

    async fn iq_source(&mut self) -> DriverResult<IqSource> {
        self.get_text(Attribute::IqSource).await?.parse()
    }

    async fn set_iq_source(&mut self, source: IqSource) -> DriverResult<()> {
        self.set(Attribute::IqSource, source.as_str()).await
    }
}
