//! Instrument model profiles.
//!
//! One generic driver serves the whole SM family; what differs per model is
//! captured here: frequency bounds, the ID prefix checked during
//! initialization, and which capability groups the firmware implements.

use crate::error::DriverError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Manufacturer reported in the identity metadata.
pub const MANUFACTURER: &str = "Rohde & Schwarz";

/// Driver description reported in the identity metadata.
pub const DESCRIPTION: &str = "Rohde & Schwarz SM... series IVI RF signal generator driver";

/// Family default lower frequency bound in Hz.
pub const DEFAULT_FREQUENCY_LOW: f64 = 250e3;

/// Family default upper frequency bound in Hz.
pub const DEFAULT_FREQUENCY_HIGH: f64 = 4e9;

/// Number of instrument state memories addressable by `*SAV`/`*RCL`.
pub const MEMORY_SIZE: usize = 10;

/// Groups of attributes and methods a model may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// RF carrier frequency, level and output
    RfBase,
    /// Internal LF generator
    LfGenerator,
    /// LF generator output stage
    LfGeneratorOutput,
    /// IQ modulation
    ModulateIq,
    /// ARB baseband generator
    ArbGenerator,
    /// Mass memory and state memories
    Memory,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::RfBase => "Base",
            Capability::LfGenerator => "LFGenerator",
            Capability::LfGeneratorOutput => "LFGeneratorOutput",
            Capability::ModulateIq => "ModulateIQ",
            Capability::ArbGenerator => "ArbGenerator",
            Capability::Memory => "Memory",
        };
        f.write_str(name)
    }
}

const ALL_CAPABILITIES: &[Capability] = &[
    Capability::RfBase,
    Capability::LfGenerator,
    Capability::LfGeneratorOutput,
    Capability::ModulateIq,
    Capability::ArbGenerator,
    Capability::Memory,
];

// Baseband source without an RF path.
const BASEBAND_CAPABILITIES: &[Capability] = &[
    Capability::ModulateIq,
    Capability::ArbGenerator,
    Capability::Memory,
];

/// Supported SM-series models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstrumentModel {
    /// SMW200A vector signal generator
    #[serde(rename = "SMW200A")]
    Smw200a,
    /// SMBV100A vector signal generator
    #[serde(rename = "SMBV100A")]
    Smbv100a,
    /// SMU200A vector signal generator
    #[serde(rename = "SMU200A")]
    Smu200a,
    /// SMATE200A vector signal generator
    #[serde(rename = "SMATE200A")]
    Smate200a,
    /// SMJ100A vector signal generator
    #[serde(rename = "SMJ100A")]
    Smj100a,
    /// Baseband generator, no RF path
    #[serde(rename = "AMU200A")]
    Amu200a,
}

impl InstrumentModel {
    /// Every model the driver supports.
    pub const SUPPORTED: [InstrumentModel; 6] = [
        InstrumentModel::Smw200a,
        InstrumentModel::Smbv100a,
        InstrumentModel::Smu200a,
        InstrumentModel::Smate200a,
        InstrumentModel::Smj100a,
        InstrumentModel::Amu200a,
    ];

    /// Model name as reported by `*IDN?`, e.g. `SMBV100A`.
    pub fn name(self) -> &'static str {
        match self {
            InstrumentModel::Smw200a => "SMW200A",
            InstrumentModel::Smbv100a => "SMBV100A",
            InstrumentModel::Smu200a => "SMU200A",
            InstrumentModel::Smate200a => "SMATE200A",
            InstrumentModel::Smj100a => "SMJ100A",
            InstrumentModel::Amu200a => "AMU200A",
        }
    }

    /// Prefix of the `*IDN?` model field expected from this model.
    pub fn id_prefix(self) -> &'static str {
        match self {
            InstrumentModel::Smw200a => "SMW",
            InstrumentModel::Smbv100a => "SMBV",
            InstrumentModel::Smu200a => "SMU",
            InstrumentModel::Smate200a => "SMATE",
            InstrumentModel::Smj100a => "SMJ",
            InstrumentModel::Amu200a => "AMU",
        }
    }

    /// RF frequency bounds in Hz as `(low, high)`.
    pub fn frequency_range(self) -> (f64, f64) {
        match self {
            InstrumentModel::Smbv100a => (9e3, 3200e6),
            _ => (DEFAULT_FREQUENCY_LOW, DEFAULT_FREQUENCY_HIGH),
        }
    }

    /// Capability groups this model provides.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            InstrumentModel::Amu200a => BASEBAND_CAPABILITIES,
            _ => ALL_CAPABILITIES,
        }
    }

    /// Whether this model provides `capability`.
    pub fn supports(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Static identity metadata for a driver bound to this model.
    pub fn profile(self) -> ModelProfile {
        let (frequency_low, frequency_high) = self.frequency_range();
        ModelProfile {
            manufacturer: MANUFACTURER,
            description: DESCRIPTION,
            model: self,
            supported_models: InstrumentModel::SUPPORTED.iter().map(|m| m.name()).collect(),
            frequency_low,
            frequency_high,
            instrument_id: self.id_prefix().to_string(),
            capabilities: self.capabilities().to_vec(),
            memory_size: MEMORY_SIZE,
            specification_major_version: 1,
            specification_minor_version: 0,
        }
    }
}

impl fmt::Display for InstrumentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentModel {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        InstrumentModel::SUPPORTED
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DriverError::UnknownModel(s.to_string()))
    }
}

/// Static identity metadata exposed as read-only driver configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ModelProfile {
    /// Always "Rohde & Schwarz"
    pub manufacturer: &'static str,
    /// One-line driver description
    pub description: &'static str,
    pub model: InstrumentModel,
    /// Every model name this driver handles
    pub supported_models: Vec<&'static str>,
    /// Lower RF frequency bound in Hz
    pub frequency_low: f64,
    /// Upper RF frequency bound in Hz
    pub frequency_high: f64,
    /// Expected prefix of the instrument-reported model
    pub instrument_id: String,
    /// Capability groups of this model
    pub capabilities: Vec<Capability>,
    /// State memories available to `save_state`/`recall_state`
    pub memory_size: usize,
    /// IVI class specification major version
    pub specification_major_version: u32,
    /// IVI class specification minor version
    pub specification_minor_version: u32,
}
