//! Generic SM-series driver.
//!
//! [`SmDriver`] owns one instrument session, one cache table and the static
//! profile of the model it drives. All attribute access goes through
//! [`SmDriver::get`] and [`SmDriver::set`], which interpret the declarative
//! table in [`crate::attribute`]; the capability traits in [`crate::traits`]
//! are typed wrappers over these two calls.
//!
//! ## Initialization
//!
//! ```text
//! Uninitialized -> SessionOpen -> InterfaceCleared
//!               -> IdentityVerified (id_query) -> Reset (reset) -> Ready
//! ```
//!
//! Steps run strictly in order, once per [`SmDriver::initialize`] call. If a
//! step fails the session is closed and the driver falls back to
//! `Uninitialized`.
//!
//! ## Example
//!
//! ```no_run
//! use rs_siggen::driver::{DriverOptions, SmDriver};
//! use rs_siggen::model::InstrumentModel;
//! use rs_siggen::session::SimulatedSession;
//! use rs_siggen::traits::RfBase;
//!
//! # async fn example() -> rs_siggen::error::DriverResult<()> {
//! let mut driver = SmDriver::new(InstrumentModel::Smbv100a);
//! let session = SimulatedSession::for_model("SMBV100A");
//! driver
//!     .initialize(Box::new(session), DriverOptions { id_query: true, ..Default::default() })
//!     .await?;
//!
//! driver.set_rf_frequency(1.5e9).await?;
//! driver.set_rf_output_enabled(true).await?;
//! println!("RF: {} Hz", driver.rf_frequency().await?);
//! driver.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::attribute::{Attribute, AttributeValue, Fallback, ReadPlan};
use crate::cache::AttributeCache;
use crate::error::{DriverError, DriverResult};
use crate::model::{Capability, InstrumentModel, ModelProfile};
use crate::scpi::{self, Identity};
use crate::session::{self, InstrumentSession, SimulatedSession};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Initialization progress of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverState {
    /// No session
    Uninitialized,
    /// Session attached
    SessionOpen,
    /// `*CLS`/device clear done
    InterfaceCleared,
    /// `*IDN?` matched
    IdentityVerified,
    /// `*RST` sent
    Reset,
    /// Accepting attribute access
    Ready,
}

/// Options applied by [`SmDriver::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    /// Replace the session with a [`SimulatedSession`]
    pub simulate: bool,
    /// Verify the reported model against the expected ID prefix
    pub id_query: bool,
    /// Send `*RST` after the interface clear
    pub reset: bool,
    /// Serve reads from valid cache entries without I/O
    pub cache: bool,
    /// Override of the model's expected ID prefix
    pub instrument_id: Option<String>,
}

/// Result of `*TST?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfTestResult {
    /// Self test code; 0 means pass
    pub code: i32,
    /// Human readable outcome
    pub message: String,
}

/// Generic driver for Rohde & Schwarz SM-series signal generators.
pub struct SmDriver {
    model: InstrumentModel,
    profile: ModelProfile,
    options: DriverOptions,
    session: Option<Box<dyn InstrumentSession>>,
    cache: AttributeCache,
    state: DriverState,
    identity: Option<Identity>,
}

impl SmDriver {
    /// Create an uninitialized driver with default identity metadata.
    pub fn new(model: InstrumentModel) -> Self {
        Self {
            model,
            profile: model.profile(),
            options: DriverOptions::default(),
            session: None,
            cache: AttributeCache::new(),
            state: DriverState::Uninitialized,
            identity: None,
        }
    }

    /// The model this driver was created for.
    pub fn model(&self) -> InstrumentModel {
        self.model
    }

    /// Static identity metadata (manufacturer, supported models, frequency bounds).
    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    /// Options of the last `initialize` call.
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Current initialization state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// `true` once initialization completed.
    pub fn is_ready(&self) -> bool {
        self.state == DriverState::Ready
    }

    /// Identity reported by the instrument at the last `*IDN?`.
    pub fn instrument_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Description of the open session, if any.
    pub fn session_info(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.describe())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Run the initialization sequence on `session`.
    ///
    /// A driver that is already initialized is closed first. With
    /// `options.simulate` the given session is closed and replaced by a
    /// simulated one.
    pub async fn initialize(
        &mut self,
        session: Box<dyn InstrumentSession>,
        options: DriverOptions,
    ) -> DriverResult<()> {
        if self.session.is_some() {
            if let Err(err) = self.close().await {
                discard(session).await;
                return Err(err);
            }
        }

        let session: Box<dyn InstrumentSession> = if options.simulate {
            discard(session).await;
            Box::new(SimulatedSession::for_model(self.model.name()))
        } else {
            session
        };

        info!(
            "Initializing {} driver on {}",
            self.model,
            session.describe()
        );

        self.profile.instrument_id = options
            .instrument_id
            .clone()
            .unwrap_or_else(|| self.model.id_prefix().to_string());
        self.options = options;
        self.cache.invalidate_all();
        self.identity = None;
        self.session = Some(session);
        self.transition(DriverState::SessionOpen);

        match self.run_initialization().await {
            Ok(()) => {
                self.transition(DriverState::Ready);
                info!("{} driver ready", self.model);
                Ok(())
            }
            Err(err) => {
                warn!("{} initialization failed: {}", self.model, err);
                self.abort_initialization().await;
                Err(err)
            }
        }
    }

    /// Open a transport for `resource` and initialize on it.
    ///
    /// In simulation mode no transport is opened.
    pub async fn initialize_resource(
        &mut self,
        resource: &str,
        options: DriverOptions,
        timeout: Duration,
    ) -> DriverResult<()> {
        let session: Box<dyn InstrumentSession> = if options.simulate {
            Box::new(SimulatedSession::for_model(self.model.name()))
        } else {
            session::open_resource(resource, timeout).await?
        };
        self.initialize(session, options).await
    }

    async fn run_initialization(&mut self) -> DriverResult<()> {
        self.session_mut()?.clear().await?;
        self.transition(DriverState::InterfaceCleared);

        if self.options.id_query {
            self.verify_identity().await?;
            self.transition(DriverState::IdentityVerified);
        }

        if self.options.reset {
            self.reset().await?;
            self.transition(DriverState::Reset);
        }

        Ok(())
    }

    async fn abort_initialization(&mut self) {
        if let Some(session) = self.session.take() {
            discard(session).await;
        }
        self.cache.invalidate_all();
        self.transition(DriverState::Uninitialized);
    }

    async fn verify_identity(&mut self) -> DriverResult<()> {
        let identity = self.identify().await?;
        let expected = self.profile.instrument_id.clone();
        let reported: String = identity
            .model
            .chars()
            .take(expected.chars().count())
            .collect();

        if reported != expected {
            warn!(
                "Instrument ID mismatch: expected prefix '{}', instrument reports '{}'",
                expected, identity.model
            );
            return Err(DriverError::IdentityMismatch {
                expected,
                actual: identity.model,
            });
        }

        debug!("Identity verified: {}", identity.model);
        Ok(())
    }

    /// Close the session and mark every cache entry stale.
    pub async fn close(&mut self) -> DriverResult<()> {
        self.cache.invalidate_all();
        self.transition(DriverState::Uninitialized);
        if let Some(mut session) = self.session.take() {
            info!("Closing {} driver session", self.model);
            session.close().await?;
        }
        Ok(())
    }

    fn transition(&mut self, next: DriverState) {
        debug!("{} driver: {:?} -> {:?}", self.model, self.state, next);
        self.state = next;
    }

    // ------------------------------------------------------------------
    // Generic attribute access
    // ------------------------------------------------------------------

    /// Read an attribute.
    ///
    /// Queried attributes perform one round trip; a response that cannot be
    /// parsed is replaced by the attribute's fallback value and never fails
    /// the call. Cache-only attributes return the last written value.
    pub async fn get(&mut self, attribute: Attribute) -> DriverResult<AttributeValue> {
        let desc = attribute.descriptor();
        self.require(desc.capability)?;

        let query = match desc.read {
            ReadPlan::CacheOnly => {
                return self
                    .cache
                    .get(attribute)
                    .cloned()
                    .ok_or_else(|| DriverError::NotCached(attribute.key().to_string()));
            }
            ReadPlan::Query(query) => query,
        };

        if self.options.cache {
            if let Some(value) = self.cache.get(attribute) {
                debug!("{} served from cache", attribute);
                return Ok(value.clone());
            }
        }

        let response = self.ask(query).await?;
        let value = match desc.kind.parse_response(&response) {
            Some(value) => value,
            None => {
                let fallback = desc.fallback.unwrap_or(Fallback::Text("")).to_value();
                warn!(
                    "Unparseable response '{}' for {}; using fallback {}",
                    response.trim(),
                    attribute,
                    fallback
                );
                fallback
            }
        };

        self.cache.store(attribute, value.clone());
        Ok(value)
    }

    /// Write an attribute.
    ///
    /// Capability, type and domain checks run before any I/O. Multi-command
    /// writes are sent in order and are not rolled back if a later command
    /// fails; the attribute's cache entry is then left stale.
    pub async fn set(
        &mut self,
        attribute: Attribute,
        value: impl Into<AttributeValue> + Send,
    ) -> DriverResult<()> {
        let value = value.into();
        let desc = attribute.descriptor();
        self.require(desc.capability)?;
        desc.check_value(&value)?;
        let commands = desc.commands(&value)?;

        self.cache.invalidate(attribute);
        for command in &commands {
            self.write(command).await?;
        }

        self.cache.store(attribute, value);
        Ok(())
    }

    /// The cached value of `attribute`, if valid. Never performs I/O.
    pub fn cached(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.cache.get(attribute)
    }

    /// Mark every cache entry stale.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate_all();
    }

    pub(crate) async fn get_f64(&mut self, attribute: Attribute) -> DriverResult<f64> {
        let value = self.get(attribute).await?;
        value.as_f64().ok_or_else(|| Self::kind_error(attribute))
    }

    pub(crate) async fn get_bool(&mut self, attribute: Attribute) -> DriverResult<bool> {
        let value = self.get(attribute).await?;
        value.as_bool().ok_or_else(|| Self::kind_error(attribute))
    }

    pub(crate) async fn get_text(&mut self, attribute: Attribute) -> DriverResult<String> {
        match self.get(attribute).await? {
            AttributeValue::Text(text) => Ok(text),
            _ => Err(Self::kind_error(attribute)),
        }
    }

    fn kind_error(attribute: Attribute) -> DriverError {
        DriverError::TypeMismatch {
            attribute: attribute.key().to_string(),
            expected: attribute.descriptor().kind.name(),
        }
    }

    pub(crate) fn require(&self, capability: Capability) -> DriverResult<()> {
        if self.model.supports(capability) {
            Ok(())
        } else {
            Err(DriverError::CapabilityNotSupported {
                model: self.model.to_string(),
                capability: capability.to_string(),
            })
        }
    }

    // ------------------------------------------------------------------
    // Session access
    // ------------------------------------------------------------------

    fn session_mut(&mut self) -> DriverResult<&mut Box<dyn InstrumentSession>> {
        self.session.as_mut().ok_or(DriverError::NotInitialized)
    }

    pub(crate) async fn write(&mut self, command: &str) -> DriverResult<()> {
        debug!("SCPI write: {}", command);
        self.session_mut()?.write(command).await?;
        Ok(())
    }

    pub(crate) async fn write_raw(&mut self, data: &[u8]) -> DriverResult<()> {
        debug!("SCPI raw write: {} bytes", data.len());
        self.session_mut()?.write_raw(data).await?;
        Ok(())
    }

    pub(crate) async fn ask(&mut self, query: &str) -> DriverResult<String> {
        let response = self.session_mut()?.ask(query).await?;
        debug!("SCPI query '{}' -> '{}'", query, response.trim());
        Ok(response)
    }

    // ------------------------------------------------------------------
    // IEEE 488.2 common commands
    // ------------------------------------------------------------------

    /// Query `*IDN?` and record the reported identity.
    pub async fn identify(&mut self) -> DriverResult<Identity> {
        let response = self.ask("*IDN?").await?;
        let identity = Identity::parse(&response).unwrap_or_else(|| {
            warn!("Unparseable *IDN? response '{}'", response.trim());
            Identity::default()
        });
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    /// Send `*RST` and mark every cache entry stale.
    pub async fn reset(&mut self) -> DriverResult<()> {
        info!("Resetting {}", self.model);
        self.write("*RST").await?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Send `*CLS`.
    pub async fn clear_status(&mut self) -> DriverResult<()> {
        self.write("*CLS").await
    }

    /// Run the instrument self test (`*TST?`); code 0 means pass.
    pub async fn self_test(&mut self) -> DriverResult<SelfTestResult> {
        let response = self.ask("*TST?").await?;
        let code = scpi::unquote(&response).parse::<i32>().unwrap_or(-1);
        let message = if code == 0 {
            "Self test passed"
        } else {
            "Self test failed"
        };
        Ok(SelfTestResult {
            code,
            message: message.to_string(),
        })
    }

    /// Pop one entry from the instrument error queue (`:SYST:ERR?`).
    pub async fn error_query(&mut self) -> DriverResult<(i32, String)> {
        let response = self.ask(":SYST:ERR?").await?;
        Ok(scpi::parse_error_response(&response)
            .unwrap_or_else(|| (-1, response.trim().to_string())))
    }
}

/// Close a session the driver will not keep. Failures are only logged.
async fn discard(mut session: Box<dyn InstrumentSession>) {
    let description = session.describe();
    if let Err(err) = session.close().await {
        warn!("Failed to close discarded session {}: {}", description, err);
    }
}
