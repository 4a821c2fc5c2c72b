//! Simulated instrument session.
//!
//! Stands in for a real transport when the driver runs in simulation mode,
//! and doubles as the recording fake used by the test suite. It provides:
//! - Echo of the last value written to each command header
//! - Scripted responses for specific queries
//! - Controllable failure injection
//! - A shared transcript of every call for test verification

use super::InstrumentSession;
use crate::scpi;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// One recorded session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Text command written
    Write(String),
    /// Binary payload written without a terminator
    WriteRaw(Vec<u8>),
    /// Query sent
    Ask(String),
    /// Device clear
    Clear,
    /// Session closed
    Close,
}

#[derive(Debug, Default)]
struct SimState {
    /// Last argument written per upper-cased command header
    values: HashMap<String, String>,
    /// Fixed responses per upper-cased query
    scripted: HashMap<String, String>,
    transcript: Vec<SessionEvent>,
    closed: bool,
}

/// In-memory instrument session.
///
/// Clones share state, so a test can keep a handle after moving the session
/// into a driver.
///
/// # Example
///
/// ```
/// use rs_siggen::session::SimulatedSession;
///
/// let session = SimulatedSession::new("Rohde&Schwarz,SMBV100A,0,1.0");
/// let wire = session.clone();
/// assert!(wire.writes().is_empty());
/// ```
#[derive(Clone)]
pub struct SimulatedSession {
    identity: String,
    state: Arc<Mutex<SimState>>,
    should_fail_next: Arc<AtomicBool>,
}

impl SimulatedSession {
    /// Create a session answering `*IDN?` with `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            state: Arc::new(Mutex::new(SimState::default())),
            should_fail_next: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a session identifying as the given model.
    pub fn for_model(model: &str) -> Self {
        Self::new(format!("Rohde&Schwarz,{model},000000/000,0.0.0 (simulated)"))
    }

    /// Answer `query` with a fixed response instead of the echoed value.
    pub fn with_response(self, query: &str, response: &str) -> Self {
        self.lock()
            .scripted
            .insert(normalize(query), response.to_string());
        self
    }

    /// Make the next call fail with a transport error.
    pub fn inject_next_failure(&self) {
        self.should_fail_next.store(true, Ordering::SeqCst);
    }

    /// Every call made on this session, in order.
    pub fn transcript(&self) -> Vec<SessionEvent> {
        self.lock().transcript.clone()
    }

    /// Only the text commands written, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock()
            .transcript
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Write(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    /// Only the queries sent, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock()
            .transcript
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Ask(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget the transcript.
    pub fn clear_transcript(&self) {
        self.lock().transcript.clear();
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: SessionEvent) -> Result<()> {
        self.lock().transcript.push(event);
        if self.should_fail_next.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("Injected failure"));
        }
        Ok(())
    }

    fn apply_write(&self, command: &str) {
        let mut state = self.lock();
        for part in scpi::split_messages(command) {
            let (header, argument) = scpi::split_header(part);
            if header.is_empty() {
                continue;
            }
            if header.eq_ignore_ascii_case("*RST") {
                state.values.clear();
                continue;
            }
            state.values.insert(normalize(header), argument.to_string());
        }
    }

    fn answer(&self, query: &str) -> String {
        let state = self.lock();
        let key = normalize(query);
        if let Some(response) = state.scripted.get(&key) {
            return response.clone();
        }
        match key.as_str() {
            "*IDN?" => self.identity.clone(),
            "*TST?" => "0".to_string(),
            ":SYST:ERR?" | "SYST:ERR?" => "0,\"No error\"".to_string(),
            "*OPC?" => "1".to_string(),
            _ => state
                .values
                .get(key.trim_end_matches('?'))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

fn normalize(command: &str) -> String {
    command.trim().to_ascii_uppercase()
}

#[async_trait]
impl InstrumentSession for SimulatedSession {
    async fn write(&mut self, command: &str) -> Result<()> {
        debug!("Simulated write: {}", command);
        self.record(SessionEvent::Write(command.to_string()))?;
        self.apply_write(command);
        Ok(())
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        debug!("Simulated raw write: {} bytes", data.len());
        self.record(SessionEvent::WriteRaw(data.to_vec()))
    }

    async fn ask(&mut self, query: &str) -> Result<String> {
        self.record(SessionEvent::Ask(query.to_string()))?;
        let response = self.answer(query);
        debug!("Simulated query '{}' -> '{}'", query, response);
        Ok(response)
    }

    async fn clear(&mut self) -> Result<()> {
        self.record(SessionEvent::Clear)
    }

    async fn close(&mut self) -> Result<()> {
        self.record(SessionEvent::Close)?;
        self.lock().closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SimulatedSession({})", self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_last_written_value() {
        let mut session = SimulatedSession::for_model("SMBV100A");
        session.write(":SOUR:FREQ:CW 1.000000e+09").await.unwrap();
        assert_eq!(session.ask(":SOUR:FREQ:CW?").await.unwrap(), "1.000000e+09");
        assert_eq!(session.ask(":sour:freq:cw?").await.unwrap(), "1.000000e+09");
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty() {
        let mut session = SimulatedSession::for_model("SMBV100A");
        assert_eq!(session.ask(":SOUR:LFO:FREQ?").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_compound_message_updates_each_header() {
        let mut session = SimulatedSession::for_model("SMBV100A");
        session
            .write(":SOUR:IQ:SOUR BAS;:SOUR:BB:ARB:STAT 1")
            .await
            .unwrap();
        assert_eq!(session.ask(":SOUR:IQ:SOUR?").await.unwrap(), "BAS");
        assert_eq!(session.ask(":SOUR:BB:ARB:STAT?").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_quoted_separator_is_part_of_the_value() {
        let mut session = SimulatedSession::for_model("SMBV100A");
        session
            .write(":SOUR:BB:ARB:WAV:SEL 'a;b';:SOUR:BB:ARB:STAT 1")
            .await
            .unwrap();
        assert_eq!(session.ask(":SOUR:BB:ARB:WAV:SEL?").await.unwrap(), "'a;b'");
        assert_eq!(session.ask(":SOUR:BB:ARB:STAT?").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_reset_forgets_values() {
        let mut session = SimulatedSession::for_model("SMBV100A");
        session.write(":OUTP:STATE 1").await.unwrap();
        session.write("*RST").await.unwrap();
        assert_eq!(session.ask(":OUTP:STATE?").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_scripted_response_and_identity() {
        let mut session =
            SimulatedSession::new("Rohde&Schwarz,SMW200A,1412.0000K02/101234,4.70.026.38")
                .with_response(":OUTP:STATE?", "garbage");
        assert_eq!(session.ask(":OUTP:STATE?").await.unwrap(), "garbage");
        assert!(session.ask("*IDN?").await.unwrap().contains("SMW200A"));
    }

    #[tokio::test]
    async fn test_failure_injection_is_consumed() {
        let mut session = SimulatedSession::for_model("SMBV100A");
        session.inject_next_failure();
        assert!(session.write("*CLS").await.is_err());
        assert!(session.write("*CLS").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_transcript() {
        let session = SimulatedSession::for_model("SMBV100A");
        let wire = session.clone();
        let mut boxed: Box<dyn InstrumentSession> = Box::new(session);
        boxed.clear().await.unwrap();
        boxed.write_raw(b"\x01\x02").await.unwrap();
        boxed.close().await.unwrap();
        assert_eq!(
            wire.transcript(),
            vec![
                SessionEvent::Clear,
                SessionEvent::WriteRaw(vec![1, 2]),
                SessionEvent::Close
            ]
        );
        assert!(wire.is_closed());
    }
}
