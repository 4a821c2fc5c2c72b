//! RF output: CW frequency, level and output state.

use crate::attribute::Attribute;
use crate::driver::SmDriver;
use crate::error::DriverResult;
use async_trait::async_trait;

/// Base RF signal generator capability.
#[async_trait]
pub trait RfBase: Send {
    /// CW frequency in Hz. Reads `0.0` if the response cannot be parsed.
    async fn rf_frequency(&mut self) -> DriverResult<f64>;

    /// Set the CW frequency in Hz. The model's frequency range is not enforced.
    async fn set_rf_frequency(&mut self, hz: f64) -> DriverResult<()>;

    /// Output level in dBm.
    async fn rf_level(&mut self) -> DriverResult<f64>;

    /// Set the output level in dBm.
    async fn set_rf_level(&mut self, dbm: f64) -> DriverResult<()>;

    /// RF output state.
    async fn rf_output_enabled(&mut self) -> DriverResult<bool>;

    /// Switch the RF output on or off.
    async fn set_rf_output_enabled(&mut self, enabled: bool) -> DriverResult<()>;
}

#[async_trait]
impl RfBase for SmDriver {
    async fn rf_frequency(&mut self) -> DriverResult<f64> {
        self.get_f64(Attribute::RfFrequency).await
    }

    async fn set_rf_frequency(&mut self, hz: f64) -> DriverResult<()> {
        self.set(Attribute::RfFrequency, hz).await
    }

    async fn rf_level(&mut self) -> DriverResult<f64> {
        self.get_f64(Attribute::RfLevel).await
    }

    async fn set_rf_level(&mut self, dbm: f64) -> DriverResult<()> {
        self.set(Attribute::RfLevel, dbm).await
    }

    async fn rf_output_enabled(&mut self) -> DriverResult<bool> {
        self.get_bool(Attribute::RfOutputEnabled).await
    }

    async fn set_rf_output_enabled(&mut self, enabled: bool) -> DriverResult<()> {
        self.set(Attribute::RfOutputEnabled, enabled).await
    }
}
