//! SCPI text helpers.
//!
//! Formatting follows the conventions the SM-series firmware expects from IVI
//! drivers: floats in C `%e` notation, booleans as `0`/`1`, strings in single
//! quotes and binary payloads behind an IEEE 488.2 definite-length block header.
//!
//! Parsing is tolerant. Every `parse_*` function returns `None` instead of an
//! error so callers can substitute a documented fallback value.

use prse::try_parse;
use serde::Serialize;

/// Format a float the way C's `%e` does: six fraction digits and a signed,
/// at least two digit exponent (`1.000000e+09`).
pub fn format_exp(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Boolean literal used by SCPI state commands.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Wrap a string in single quotes.
pub fn quote(value: &str) -> String {
    format!("'{value}'")
}

/// IEEE 488.2 definite-length block header for a payload of `len` bytes,
/// e.g. `#210` for ten bytes.
pub fn block_header(len: usize) -> String {
    let digits = len.to_string();
    format!("#{}{}", digits.len(), digits)
}

/// Trim whitespace and strip one pair of matching surrounding quotes.
pub fn unquote(response: &str) -> &str {
    let trimmed = response.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Parse a numeric response.
pub fn parse_float(response: &str) -> Option<f64> {
    unquote(response).parse::<f64>().ok()
}

/// Parse a boolean response through its integer value; any non-zero integer is `true`.
pub fn parse_bool(response: &str) -> Option<bool> {
    unquote(response).parse::<i64>().ok().map(|v| v != 0)
}

/// Pass an enumerated response through; an empty response is a parse failure.
pub fn parse_choice(response: &str) -> Option<String> {
    let text = unquote(response);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Split a SCPI command into its header and argument (`":OUTP:STATE 1"` ->
/// `(":OUTP:STATE", "1")`).
pub fn split_header(command: &str) -> (&str, &str) {
    let command = command.trim();
    match command.split_once(char::is_whitespace) {
        Some((header, argument)) => (header, argument.trim()),
        None => (command, ""),
    }
}

/// Split a compound program message into its `;` separated units.
///
/// Separators inside single or double quoted strings belong to the string.
pub fn split_messages(command: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in command.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ';') => {
                units.push(&command[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
    }
    units.push(&command[start..]);
    units
}

/// Parsed `*IDN?` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Identity {
    /// Manufacturer field, e.g. `Rohde&Schwarz`
    pub manufacturer: String,
    /// Model field, e.g. `SMBV100A`
    pub model: String,
    /// Serial / part number field
    pub serial: String,
    /// Firmware revision field
    pub firmware: String,
}

impl Identity {
    /// Parse a comma separated `*IDN?` response.
    pub fn parse(response: &str) -> Option<Self> {
        let fields: Result<(String, String, String, String), _> =
            try_parse!(response.trim(), "{},{},{},{}");
        let (manufacturer, model, serial, firmware) = fields.ok()?;
        Some(Self {
            manufacturer: manufacturer.trim().to_string(),
            model: model.trim().to_string(),
            serial: serial.trim().to_string(),
            firmware: firmware.trim().to_string(),
        })
    }
}

/// Parse a `:SYST:ERR?` response (`-221,"Settings conflict"`).
pub fn parse_error_response(response: &str) -> Option<(i32, String)> {
    let fields: Result<(i32, String), _> = try_parse!(response.trim(), "{},{}");
    let (code, message) = fields.ok()?;
    Some((code, unquote(&message).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exp_matches_c_notation() {
        assert_eq!(format_exp(1e9), "1.000000e+09");
        assert_eq!(format_exp(-12.5), "-1.250000e+01");
        assert_eq!(format_exp(0.0), "0.000000e+00");
        assert_eq!(format_exp(2.5e-3), "2.500000e-03");
        assert_eq!(format_exp(1.5e100), "1.500000e+100");
        assert_eq!(format_exp(f64::INFINITY), "inf");
    }

    #[test]
    fn test_block_header() {
        assert_eq!(block_header(10), "#210");
        assert_eq!(block_header(7), "#17");
        assert_eq!(block_header(123_456), "#6123456");
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_quotes() {
        assert_eq!(parse_float(" 1.5E+06\n"), Some(1.5e6));
        assert_eq!(parse_float("'1.000000e+08'"), Some(1e8));
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("garbage"), None);
        assert_eq!(parse_bool("1\n"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("ON"), None);
        assert_eq!(unquote("\"/var/user/test.wv\""), "/var/user/test.wv");
        assert_eq!(parse_choice("  "), None);
    }

    #[test]
    fn test_split_header() {
        assert_eq!(split_header(":OUTP:STATE 1"), (":OUTP:STATE", "1"));
        assert_eq!(split_header("*RST"), ("*RST", ""));
    }

    #[test]
    fn test_split_messages_respects_quotes() {
        assert_eq!(
            split_messages(":SOUR:IQ:SOUR BAS;:SOUR:BB:ARB:STAT 1"),
            vec![":SOUR:IQ:SOUR BAS", ":SOUR:BB:ARB:STAT 1"]
        );
        assert_eq!(
            split_messages(":SOUR:BB:ARB:WAV:SEL 'a;b'"),
            vec![":SOUR:BB:ARB:WAV:SEL 'a;b'"]
        );
        assert_eq!(
            split_messages(":MMEM:DEL \"x;'y\";*CLS"),
            vec![":MMEM:DEL \"x;'y\"", "*CLS"]
        );
        assert_eq!(split_messages("*RST"), vec!["*RST"]);
    }

    #[test]
    fn test_identity_parse() {
        let idn = Identity::parse("Rohde&Schwarz,SMBV100A,1407.6004k02/260172,3.1.19.15\n")
            .expect("valid identity");
        assert_eq!(idn.manufacturer, "Rohde&Schwarz");
        assert_eq!(idn.model, "SMBV100A");
        assert_eq!(idn.firmware, "3.1.19.15");
        assert!(Identity::parse("no commas here").is_none());
    }

    #[test]
    fn test_parse_error_response() {
        assert_eq!(
            parse_error_response("-221,\"Settings conflict\""),
            Some((-221, "Settings conflict".to_string()))
        );
        assert_eq!(parse_error_response("0,\"No error\""), Some((0, "No error".to_string())));
    }
}
