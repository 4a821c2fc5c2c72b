//! Declarative attribute table.
//!
//! Every instrument setting the driver exposes is described by one
//! [`AttributeDescriptor`]: its value kind, the SCPI query used to read it, the
//! SCPI command(s) used to write it, and the value substituted when a response
//! cannot be parsed. The generic accessor in [`crate::driver`] interprets these
//! descriptors; there is no per-attribute getter/setter code.
//!
//! Command templates carry a `{value}` placeholder which is expanded with
//! `strfmt` after the value has been formatted for its kind.

use crate::error::{DriverError, DriverResult};
use crate::model::Capability;
use crate::scpi;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Waveform shapes accepted by the LF generator.
pub const LF_WAVEFORMS: &[&str] = &["sine", "square", "triangle", "ramp_up", "ramp_down"];

/// Sources that can drive the IQ modulator.
pub const IQ_SOURCES: &[&str] = &["external", "arb_generator", "digital_modulation_base"];

/// Trigger sources of the ARB generator.
pub const ARB_TRIGGER_SOURCES: &[&str] = &["immediate", "external", "software"];

/// Instrument attributes exposed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// RF carrier frequency in Hz
    RfFrequency,
    /// RF output level in dBm
    RfLevel,
    /// RF output switch
    RfOutputEnabled,
    /// LF generator frequency in Hz
    LfGeneratorFrequency,
    /// LF generator waveform shape
    LfGeneratorWaveform,
    /// LF output amplitude in volts
    LfGeneratorOutputAmplitude,
    /// LF output switch
    LfGeneratorOutputEnabled,
    /// IQ modulation switch
    IqEnabled,
    /// IQ modulation source (cache-only)
    IqSource,
    /// Selected ARB waveform file
    ArbSelectedWaveform,
    /// ARB sample clock in Hz
    ArbClockFrequency,
    /// ARB trigger source (cache-only)
    ArbTriggerSource,
}

impl Attribute {
    /// All attributes in table order.
    pub const ALL: [Attribute; 12] = [
        Attribute::RfFrequency,
        Attribute::RfLevel,
        Attribute::RfOutputEnabled,
        Attribute::LfGeneratorFrequency,
        Attribute::LfGeneratorWaveform,
        Attribute::LfGeneratorOutputAmplitude,
        Attribute::LfGeneratorOutputEnabled,
        Attribute::IqEnabled,
        Attribute::IqSource,
        Attribute::ArbSelectedWaveform,
        Attribute::ArbClockFrequency,
        Attribute::ArbTriggerSource,
    ];

    /// Position of this attribute in [`DESCRIPTORS`] and in the cache table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The static descriptor for this attribute.
    pub fn descriptor(self) -> &'static AttributeDescriptor {
        &DESCRIPTORS[self.index()]
    }

    /// Stable snake-case key.
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Attribute {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.key() == key)
            .ok_or_else(|| DriverError::UnknownAttribute(s.to_string()))
    }
}

/// A value read from or written to an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Numeric value
    Float(f64),
    /// Switch state
    Bool(bool),
    /// Text or enumerated value
    Text(String),
}

impl AttributeValue {
    /// The numeric value, if this is a `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The switch state, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is a `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// Semantic type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Number sent in `%e` notation
    Float,
    /// Switch sent as `0`/`1`
    Bool,
    /// Enumerated string restricted to the given domain
    Choice(&'static [&'static str]),
    /// Free-form string
    Text,
}

impl ValueKind {
    /// Human readable kind name used in type mismatch errors.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Float => "float",
            ValueKind::Bool => "boolean",
            ValueKind::Choice(_) => "enumerated string",
            ValueKind::Text => "string",
        }
    }

    /// Parse an instrument response. `None` means the fallback applies.
    pub fn parse_response(self, response: &str) -> Option<AttributeValue> {
        match self {
            ValueKind::Float => scpi::parse_float(response).map(AttributeValue::Float),
            ValueKind::Bool => scpi::parse_bool(response).map(AttributeValue::Bool),
            ValueKind::Choice(_) => scpi::parse_choice(response).map(AttributeValue::Text),
            ValueKind::Text => Some(AttributeValue::Text(scpi::unquote(response).to_string())),
        }
    }

    /// Parse user input (CLI, config) into a value of this kind.
    pub fn parse_input(self, input: &str) -> Option<AttributeValue> {
        let input = input.trim();
        match self {
            ValueKind::Float => input.parse::<f64>().ok().map(AttributeValue::Float),
            ValueKind::Bool => match input.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => Some(AttributeValue::Bool(true)),
                "0" | "false" | "off" => Some(AttributeValue::Bool(false)),
                _ => None,
            },
            ValueKind::Choice(_) | ValueKind::Text => Some(AttributeValue::Text(input.to_string())),
        }
    }

    /// Format a value for insertion into a command template.
    pub fn format_value(self, value: &AttributeValue) -> Option<String> {
        match (self, value) {
            (ValueKind::Float, AttributeValue::Float(v)) => Some(scpi::format_exp(*v)),
            (ValueKind::Bool, AttributeValue::Bool(v)) => Some(scpi::format_bool(*v).to_string()),
            (ValueKind::Choice(_) | ValueKind::Text, AttributeValue::Text(v)) => Some(v.clone()),
            _ => None,
        }
    }
}

/// How an attribute is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPlan {
    /// Send this query and parse the response
    Query(&'static str),
    /// No query exists; the last written value is returned from the cache
    CacheOnly,
}

/// How an attribute is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    /// One command built from a `{value}` template
    Template(&'static str),
    /// A fixed command sequence per enumerated choice
    Sequence(&'static [(&'static str, &'static [&'static str])]),
}

/// Value substituted when a response cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// Numeric fallback
    Float(f64),
    /// Switch fallback
    Bool(bool),
    /// Text fallback
    Text(&'static str),
}

impl Fallback {
    /// The attribute value this fallback stands for.
    pub fn to_value(self) -> AttributeValue {
        match self {
            Fallback::Float(v) => AttributeValue::Float(v),
            Fallback::Bool(v) => AttributeValue::Bool(v),
            Fallback::Text(v) => AttributeValue::Text(v.to_string()),
        }
    }
}

/// Static description of one instrument attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDescriptor {
    /// Attribute this entry describes
    pub attribute: Attribute,
    /// Stable snake_case name used by the CLI and in errors
    pub key: &'static str,
    /// Capability the model must support
    pub capability: Capability,
    /// Value type
    pub kind: ValueKind,
    /// How the value is read back
    pub read: ReadPlan,
    /// How a value is written
    pub write: WritePlan,
    /// `None` for cache-only attributes
    pub fallback: Option<Fallback>,
}

impl AttributeDescriptor {
    /// Validate `value` against the kind and domain; no I/O is involved.
    pub fn check_value(&self, value: &AttributeValue) -> DriverResult<()> {
        let mismatch = || DriverError::TypeMismatch {
            attribute: self.key.to_string(),
            expected: self.kind.name(),
        };
        match (self.kind, value) {
            (ValueKind::Float, AttributeValue::Float(_))
            | (ValueKind::Bool, AttributeValue::Bool(_))
            | (ValueKind::Text, AttributeValue::Text(_)) => Ok(()),
            (ValueKind::Choice(domain), AttributeValue::Text(v)) => {
                if domain.contains(&v.as_str()) {
                    Ok(())
                } else {
                    Err(DriverError::ValueNotSupported {
                        attribute: self.key.to_string(),
                        value: v.clone(),
                    })
                }
            }
            _ => Err(mismatch()),
        }
    }

    /// Build the SCPI command(s) that write `value`. The value must already
    /// have passed [`check_value`](Self::check_value).
    pub fn commands(&self, value: &AttributeValue) -> DriverResult<Vec<String>> {
        match self.write {
            WritePlan::Template(template) => {
                let formatted =
                    self.kind
                        .format_value(value)
                        .ok_or_else(|| DriverError::TypeMismatch {
                            attribute: self.key.to_string(),
                            expected: self.kind.name(),
                        })?;
                let vars = std::collections::HashMap::from([("value".to_string(), formatted)]);
                Ok(vec![strfmt::strfmt(template, &vars)?])
            }
            WritePlan::Sequence(table) => {
                let choice = value.as_str().unwrap_or_default();
                table
                    .iter()
                    .find(|(name, _)| *name == choice)
                    .map(|(_, commands)| commands.iter().map(|c| c.to_string()).collect())
                    .ok_or_else(|| DriverError::ValueNotSupported {
                        attribute: self.key.to_string(),
                        value: choice.to_string(),
                    })
            }
        }
    }
}

const IQ_SOURCE_SEQUENCES: &[(&str, &[&str])] = &[
    (
        "external",
        &[":SOUR:BB:ARB:STAT 0", ":SOUR:BB:DM:STAT 0", ":SOUR:IQ:SOUR ANAL"],
    ),
    (
        "arb_generator",
        &[
            ":SOUR:BB:ARB:STAT 0",
            ":SOUR:BB:DM:STAT 0",
            ":SOUR:IQ:SOUR BAS;:SOUR:BB:ARB:STAT 1",
        ],
    ),
    (
        "digital_modulation_base",
        &[
            ":SOUR:BB:ARB:STAT 0",
            ":SOUR:BB:DM:STAT 0",
            ":SOUR:IQ:SOUR BAS;:SOUR:BB:DM:STAT 1",
        ],
    ),
];

const ARB_TRIGGER_SEQUENCES: &[(&str, &[&str])] = &[
    ("immediate", &[":SOUR:BB:ARB:TRIG:SEQ AUTO"]),
    (
        "external",
        &[":SOUR:BB:ARB:TRIG:SEQ SING", ":SOUR:BB:ARB:TRIG:SOUR EXT"],
    ),
    (
        "software",
        &[":SOUR:BB:ARB:TRIG:SEQ SING", ":SOUR:BB:ARB:TRIG:SOUR INT"],
    ),
];

/// The attribute table, in [`Attribute`] declaration order.
pub static DESCRIPTORS: [AttributeDescriptor; 12] = [
    AttributeDescriptor {
        attribute: Attribute::RfFrequency,
        key: "rf_frequency",
        capability: Capability::RfBase,
        kind: ValueKind::Float,
        read: ReadPlan::Query(":SOUR:FREQ:CW?"),
        write: WritePlan::Template(":SOUR:FREQ:CW {value}"),
        fallback: Some(Fallback::Float(0.0)),
    },
    AttributeDescriptor {
        attribute: Attribute::RfLevel,
        key: "rf_level",
        capability: Capability::RfBase,
        kind: ValueKind::Float,
        read: ReadPlan::Query(":SOUR:POW:LEV:IMM:AMPL?"),
        write: WritePlan::Template(":SOUR:POW:LEV:IMM:AMPL {value}"),
        fallback: Some(Fallback::Float(0.0)),
    },
    AttributeDescriptor {
        attribute: Attribute::RfOutputEnabled,
        key: "rf_output_enabled",
        capability: Capability::RfBase,
        kind: ValueKind::Bool,
        read: ReadPlan::Query(":OUTP:STATE?"),
        write: WritePlan::Template(":OUTP:STATE {value}"),
        fallback: Some(Fallback::Bool(false)),
    },
    AttributeDescriptor {
        attribute: Attribute::LfGeneratorFrequency,
        key: "lf_generator_frequency",
        capability: Capability::LfGenerator,
        kind: ValueKind::Float,
        read: ReadPlan::Query(":SOUR:LFO:FREQ?"),
        write: WritePlan::Template(":SOUR:LFO:FREQ {value}"),
        fallback: Some(Fallback::Float(0.0)),
    },
    AttributeDescriptor {
        attribute: Attribute::LfGeneratorWaveform,
        key: "lf_generator_waveform",
        capability: Capability::LfGenerator,
        kind: ValueKind::Choice(LF_WAVEFORMS),
        read: ReadPlan::Query(":SOUR:LFO:SHAP?"),
        write: WritePlan::Template(":SOUR:LFO:SHAP {value}"),
        fallback: Some(Fallback::Text("sine")),
    },
    AttributeDescriptor {
        attribute: Attribute::LfGeneratorOutputAmplitude,
        key: "lf_generator_output_amplitude",
        capability: Capability::LfGeneratorOutput,
        kind: ValueKind::Float,
        read: ReadPlan::Query(":SOUR:LFO:VOLT?"),
        write: WritePlan::Template(":SOUR:LFO:VOLT {value}"),
        fallback: Some(Fallback::Float(1.0)),
    },
    AttributeDescriptor {
        attribute: Attribute::LfGeneratorOutputEnabled,
        key: "lf_generator_output_enabled",
        capability: Capability::LfGeneratorOutput,
        kind: ValueKind::Bool,
        read: ReadPlan::Query(":SOUR:LFO:STAT?"),
        write: WritePlan::Template(":SOUR:LFO:STAT {value}"),
        fallback: Some(Fallback::Bool(false)),
    },
    AttributeDescriptor {
        attribute: Attribute::IqEnabled,
        key: "iq_enabled",
        capability: Capability::ModulateIq,
        kind: ValueKind::Bool,
        read: ReadPlan::Query(":SOUR:IQ:STAT?"),
        write: WritePlan::Template(":SOUR:IQ:STAT {value}"),
        fallback: Some(Fallback::Bool(false)),
    },
    AttributeDescriptor {
        attribute: Attribute::IqSource,
        key: "iq_source",
        capability: Capability::ModulateIq,
        kind: ValueKind::Choice(IQ_SOURCES),
        read: ReadPlan::CacheOnly,
        write: WritePlan::Sequence(IQ_SOURCE_SEQUENCES),
        fallback: None,
    },
    AttributeDescriptor {
        attribute: Attribute::ArbSelectedWaveform,
        key: "arb_selected_waveform",
        capability: Capability::ArbGenerator,
        kind: ValueKind::Text,
        read: ReadPlan::Query(":SOUR:BB:ARB:WAV:SEL?"),
        write: WritePlan::Template(":SOUR:BB:ARB:WAV:SEL '{value}'"),
        fallback: Some(Fallback::Text("")),
    },
    AttributeDescriptor {
        attribute: Attribute::ArbClockFrequency,
        key: "arb_clock_frequency",
        capability: Capability::ArbGenerator,
        kind: ValueKind::Float,
        read: ReadPlan::Query(":SOUR:BB:ARB:WAV:CLOCK?"),
        write: WritePlan::Template(":SOUR:BB:ARB:WAV:CLOCK '{value}'"),
        fallback: Some(Fallback::Float(0.0)),
    },
    AttributeDescriptor {
        attribute: Attribute::ArbTriggerSource,
        key: "arb_trigger_source",
        capability: Capability::ArbGenerator,
        kind: ValueKind::Choice(ARB_TRIGGER_SOURCES),
        read: ReadPlan::CacheOnly,
        write: WritePlan::Sequence(ARB_TRIGGER_SEQUENCES),
        fallback: None,
    },
];
