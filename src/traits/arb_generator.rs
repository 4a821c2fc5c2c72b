//! Baseband ARB (arbitrary waveform) generator.

use crate::attribute::{Attribute, ARB_TRIGGER_SOURCES};
use crate::driver::SmDriver;
use crate::error::{DriverError, DriverResult};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Trigger mode of the ARB generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbTriggerSource {
    /// Free running
    Immediate,
    /// Single shot from the external trigger input
    External,
    /// Single shot from an internal (bus) trigger
    Software,
}

impl ArbTriggerSource {
    /// Every trigger source.
    pub const ALL: [ArbTriggerSource; 3] = [
        ArbTriggerSource::Immediate,
        ArbTriggerSource::External,
        ArbTriggerSource::Software,
    ];

    /// Name accepted by the `arb_trigger_source` attribute.
    pub fn as_str(self) -> &'static str {
        ARB_TRIGGER_SOURCES[self as usize]
    }
}

impl fmt::Display for ArbTriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArbTriggerSource {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArbTriggerSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| DriverError::ValueNotSupported {
                attribute: Attribute::ArbTriggerSource.key().to_string(),
                value: s.to_string(),
            })
    }
}

/// ARB generator capability.
#[async_trait]
pub trait ArbGenerator: Send {
    /// Path of the selected waveform file, unquoted.
    async fn arb_selected_waveform(&mut self) -> DriverResult<String>;

    /// Select a waveform file; the path is sent quoted.
    async fn set_arb_selected_waveform(&mut self, path: &str) -> DriverResult<()>;

    /// Sample clock in Hz.
    async fn arb_clock_frequency(&mut self) -> DriverResult<f64>;

    /// Set the sample clock in Hz.
    async fn set_arb_clock_frequency(&mut self, hz: f64) -> DriverResult<()>;

    /// Last trigger source written through this driver (`NotCached` before that).
    async fn arb_trigger_source(&mut self) -> DriverResult<ArbTriggerSource>;

    /// Select the trigger source.
    async fn set_arb_trigger_source(&mut self, source: ArbTriggerSource) -> DriverResult<()>;
}

#[async_trait]
impl ArbGenerator for SmDriver {
    async fn arb_selected_waveform(&mut self) -> DriverResult<String> {
        self.get_text(Attribute::ArbSelectedWaveform).await
    }

    async fn set_arb_selected_waveform(&mut self, path: &str) -> DriverResult<()> {
        self.set(Attribute::ArbSelectedWaveform, path).await
    }

    async fn arb_clock_frequency(&mut self) -> DriverResult<f64> {
        self.get_f64(Attribute::ArbClockFrequency).await
    }

    async fn set_arb_clock_frequency(&mut self, hz: f64) -> DriverResult<()> {
        self.set(Attribute::ArbClockFrequency, hz).await
    }

    async fn arb_trigger_source(&mut self) -> DriverResult<ArbTriggerSource> {
        self.get_text(Attribute::ArbTriggerSource).await?.parse()
    }

    async fn set_arb_trigger_source(&mut self, source: ArbTriggerSource) -> DriverResult<()> {
        self.set(Attribute::ArbTriggerSource, source.as_str()).await
    }
}
