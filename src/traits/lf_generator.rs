//! Low-frequency generator and its output stage.

use crate::attribute::{Attribute, LF_WAVEFORMS};
use crate::driver::SmDriver;
use crate::error::{DriverError, DriverResult};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// LF generator waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LfWaveform {
    /// Sine
    #[default]
    Sine,
    /// Square
    Square,
    /// Triangle
    Triangle,
    /// Rising sawtooth
    RampUp,
    /// Falling sawtooth
    RampDown,
}

impl LfWaveform {
    /// Every waveform shape.
    pub const ALL: [LfWaveform; 5] = [
        LfWaveform::Sine,
        LfWaveform::Square,
        LfWaveform::Triangle,
        LfWaveform::RampUp,
        LfWaveform::RampDown,
    ];

    /// Name accepted by the `lf_generator_waveform` attribute.
    pub fn as_str(self) -> &'static str {
        LF_WAVEFORMS[self as usize]
    }

    /// Map an instrument response, accepting the short SCPI mnemonics.
    fn from_response(response: &str) -> Option<Self> {
        match response.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Some(LfWaveform::Sine),
            "square" | "squ" | "sq" => Some(LfWaveform::Square),
            "triangle" | "tri" => Some(LfWaveform::Triangle),
            "ramp_up" | "rampup" | "rup" => Some(LfWaveform::RampUp),
            "ramp_down" | "rampdown" | "rdown" => Some(LfWaveform::RampDown),
            _ => None,
        }
    }
}

impl fmt::Display for LfWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LfWaveform {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LfWaveform::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| DriverError::ValueNotSupported {
                attribute: Attribute::LfGeneratorWaveform.key().to_string(),
                value: s.to_string(),
            })
    }
}

/// Internal LF generator.
#[async_trait]
pub trait LfGenerator: Send {
    /// Frequency in Hz.
    async fn lf_frequency(&mut self) -> DriverResult<f64>;

    /// Set the frequency in Hz.
    async fn set_lf_frequency(&mut self, hz: f64) -> DriverResult<()>;

    /// Current waveform; unrecognized responses read as [`LfWaveform::Sine`].
    async fn lf_waveform(&mut self) -> DriverResult<LfWaveform>;

    /// Set the waveform shape.
    async fn set_lf_waveform(&mut self, waveform: LfWaveform) -> DriverResult<()>;
}

/// Output stage of the LF generator.
#[async_trait]
pub trait LfGeneratorOutput: Send {
    /// Output amplitude in volts. Reads `1.0` if the response cannot be parsed.
    async fn lf_output_amplitude(&mut self) -> DriverResult<f64>;

    /// Set the amplitude in volts.
    async fn set_lf_output_amplitude(&mut self, volts: f64) -> DriverResult<()>;

    /// Output state.
    async fn lf_output_enabled(&mut self) -> DriverResult<bool>;

    /// Switch the output on or off.
    async fn set_lf_output_enabled(&mut self, enabled: bool) -> DriverResult<()>;
}

#[async_trait]
impl LfGenerator for SmDriver {
    async fn lf_frequency(&mut self) -> DriverResult<f64> {
        self.get_f64(Attribute::LfGeneratorFrequency).await
    }

    async fn set_lf_frequency(&mut self, hz: f64) -> DriverResult<()> {
        self.set(Attribute::LfGeneratorFrequency, hz).await
    }

    async fn lf_waveform(&mut self) -> DriverResult<LfWaveform> {
        let response = self.get_text(Attribute::LfGeneratorWaveform).await?;
        Ok(LfWaveform::from_response(&response).unwrap_or_else(|| {
            warn!("Unknown LF waveform '{}'; reporting sine", response);
            LfWaveform::Sine
        }))
    }

    async fn set_lf_waveform(&mut self, waveform: LfWaveform) -> DriverResult<()> {
        self.set(Attribute::LfGeneratorWaveform, waveform.as_str())
            .await
    }
}

#[async_trait]
impl LfGeneratorOutput for SmDriver {
    async fn lf_output_amplitude(&mut self) -> DriverResult<f64> {
        self.get_f64(Attribute::LfGeneratorOutputAmplitude).await
    }

    async fn set_lf_output_amplitude(&mut self, volts: f64) -> DriverResult<()> {
        self.set(Attribute::LfGeneratorOutputAmplitude, volts).await
    }

    async fn lf_output_enabled(&mut self) -> DriverResult<bool> {
        self.get_bool(Attribute::LfGeneratorOutputEnabled).await
    }

    async fn set_lf_output_enabled(&mut self, enabled: bool) -> DriverResult<()> {
        self.set(Attribute::LfGeneratorOutputEnabled, enabled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_names_follow_domain() {
        for waveform in LfWaveform::ALL {
            assert_eq!(waveform.as_str().parse::<LfWaveform>().ok(), Some(waveform));
        }
        assert!("sawtooth".parse::<LfWaveform>().is_err());
    }

    #[test]
    fn test_waveform_from_instrument_mnemonic() {
        assert_eq!(LfWaveform::from_response("SQU"), Some(LfWaveform::Square));
        assert_eq!(LfWaveform::from_response("TRI\n"), Some(LfWaveform::Triangle));
        assert_eq!(LfWaveform::from_response("TRAP"), None);
    }
}
