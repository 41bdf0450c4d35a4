use std::fmt;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::{EdrError, Result};

/// `CTIME` layout, e.g. `06-12-2015 11:36:59 AM`.
pub const CTIME_FORMAT: &str = "%m-%d-%Y %I:%M:%S %p";

// ---------------------------------------------------------------------------
// HeaderValue – the right-hand side of a KEY=VALUE line
// ---------------------------------------------------------------------------

/// A header value, typed once at parse time.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl HeaderValue {
    /// Resolve raw header text: integer first, then float, otherwise text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return HeaderValue::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return HeaderValue::Float(f);
        }
        HeaderValue::Text(raw.to_string())
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            HeaderValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Header – ordered entries plus the validated fields the decoder needs
// ---------------------------------------------------------------------------

/// Parsed EDR header.
///
/// All entries are kept in file order; the keys the decoder depends on are
/// validated and lifted into typed fields by [`Header::from_entries`].
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    entries: Vec<(String, HeaderValue)>,
    /// `NC`
    pub n_channels: usize,
    /// `NP`, samples across all channels.
    pub n_points: usize,
    /// `DT`, native sampling interval in seconds.
    pub dt: f64,
    /// `AD`, analog-to-digital reference.
    pub ad: f64,
    /// `ADCMAX`
    pub adc_max: i64,
    /// `CTIME`, unparsed.
    pub start_time_text: String,
    /// `YN0..YN{NC-1}`
    pub channel_names: Vec<String>,
    /// `YCF0..YCF{NC-1}`
    pub calibration_factors: Vec<f64>,
}

impl Header {
    /// Validate required keys and build a header from ordered entries.
    pub fn from_entries(entries: Vec<(String, HeaderValue)>) -> Result<Self> {
        let n_channels = count(&entries, "NC")?;
        let n_points = count(&entries, "NP")?;
        let dt = float(&entries, "DT")?;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(EdrError::format(format!(
                "sampling interval DT must be a positive number, got {dt}"
            )));
        }
        let ad = float(&entries, "AD")?;
        let adc_max = integer(&entries, "ADCMAX")?;
        if adc_max < 0 {
            return Err(EdrError::format(format!("ADCMAX is negative: {adc_max}")));
        }
        let start_time_text = lookup(&entries, "CTIME")?.to_string();

        // NC is untrusted; grow as the YN/YCF keys are found.
        let mut channel_names = Vec::new();
        let mut calibration_factors = Vec::new();
        for ch in 0..n_channels {
            channel_names.push(lookup(&entries, &format!("YN{ch}"))?.to_string());
            calibration_factors.push(float(&entries, &format!("YCF{ch}"))?);
        }

        Ok(Header {
            entries,
            n_channels,
            n_points,
            dt,
            ad,
            adc_max,
            start_time_text,
            channel_names,
            calibration_factors,
        })
    }

    /// Look up any header entry by key.
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rows per channel (`NP / NC`) at the native sampling interval.
    pub fn n_timepoints(&self) -> usize {
        if self.n_channels == 0 {
            0
        } else {
            self.n_points / self.n_channels
        }
    }

    /// Parse `CTIME` into the recording start time.
    pub fn file_start(&self) -> Result<NaiveDateTime> {
        parse_file_start(&self.start_time_text)
    }
}

fn lookup<'a>(entries: &'a [(String, HeaderValue)], key: &str) -> Result<&'a HeaderValue> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
        .ok_or_else(|| EdrError::format(format!("missing required header key '{key}'")))
}

fn integer(entries: &[(String, HeaderValue)], key: &str) -> Result<i64> {
    let value = lookup(entries, key)?;
    value.as_i64().ok_or_else(|| {
        EdrError::format(format!("header key '{key}' must be an integer, got '{value}'"))
    })
}

fn float(entries: &[(String, HeaderValue)], key: &str) -> Result<f64> {
    let value = lookup(entries, key)?;
    value.as_f64().ok_or_else(|| {
        EdrError::format(format!("header key '{key}' must be numeric, got '{value}'"))
    })
}

fn count(entries: &[(String, HeaderValue)], key: &str) -> Result<usize> {
    let raw = integer(entries, key)?;
    usize::try_from(raw)
        .map_err(|_| EdrError::format(format!("header key '{key}' is negative: {raw}")))
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the ASCII header block at the start of `bytes`.
///
/// Lines are consumed one at a time; a line is only kept while the cursor
/// after reading it is still within `block_size`. The line that runs past
/// the block (normally padding running into the sample data) ends parsing.
/// Blank lines and NUL padding are skipped. A later duplicate key replaces
/// the earlier value in place.
pub fn parse_header(bytes: &[u8], block_size: usize) -> Result<Header> {
    let mut entries: Vec<(String, HeaderValue)> = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let line_end = bytes[cursor..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| cursor + i + 1)
            .unwrap_or(bytes.len());
        let raw = &bytes[cursor..line_end];
        cursor = line_end;

        if cursor > block_size {
            break;
        }

        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
        if line.trim_start_matches('\0').is_empty() {
            continue;
        }

        let mut parts = line.split('=');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => {
                return Err(EdrError::format(format!(
                    "header line '{line}' must contain exactly one '='"
                )))
            }
        };

        let value = HeaderValue::parse(value);
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key.to_string(), value)),
        }
    }

    log::debug!("Parsed {} header entries", entries.len());
    Header::from_entries(entries)
}

/// Parse a `CTIME` string such as `06-12-2015 11:36:59 AM`.
pub fn parse_file_start(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), CTIME_FORMAT)
        .map_err(|e| EdrError::format(format!("unparseable CTIME '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn block(lines: &[&str], size: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = lines.iter().flat_map(|l| format!("{l}\r\n").into_bytes()).collect();
        bytes.resize(size, 0);
        bytes
    }

    fn minimal() -> Vec<&'static str> {
        vec![
            "VER=6.1",
            "NC=2",
            "NP=10",
            "DT=0.0002",
            "AD=10",
            "ADCMAX=2047",
            "CTIME=06-12-2015 11:36:59 AM",
            "YN0=Lamp",
            "YCF0=1.5",
            "YN1=Ramp",
            "YCF1=2",
        ]
    }

    #[test]
    fn values_resolve_int_then_float_then_text() {
        assert_eq!(HeaderValue::parse("42"), HeaderValue::Integer(42));
        assert_eq!(HeaderValue::parse("-3"), HeaderValue::Integer(-3));
        assert_eq!(HeaderValue::parse("0.25"), HeaderValue::Float(0.25));
        assert_eq!(HeaderValue::parse("1e-3"), HeaderValue::Float(1e-3));
        assert_eq!(HeaderValue::parse("Barpos"), HeaderValue::Text("Barpos".into()));
    }

    #[test]
    fn parses_required_fields() {
        let header = parse_header(&block(&minimal(), 256), 256).unwrap();
        assert_eq!(header.n_channels, 2);
        assert_eq!(header.n_points, 10);
        assert_eq!(header.n_timepoints(), 5);
        assert!((header.dt - 0.0002).abs() < 1e-12);
        // integer literal widened for a float key
        assert_eq!(header.ad, 10.0);
        assert_eq!(header.adc_max, 2047);
        assert_eq!(header.channel_names, vec!["Lamp", "Ramp"]);
        assert_eq!(header.calibration_factors, vec![1.5, 2.0]);
        assert_eq!(header.get("VER"), Some(&HeaderValue::Float(6.1)));
        let keys: Vec<&str> = header.entries().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "VER");
        assert_eq!(keys.len(), 11);
    }

    #[test]
    fn missing_required_key_is_format_error() {
        let lines: Vec<&str> = minimal().into_iter().filter(|l| !l.starts_with("YCF1")).collect();
        let err = parse_header(&block(&lines, 256), 256).unwrap_err();
        assert!(matches!(err, EdrError::Format(ref m) if m.contains("YCF1")));
    }

    fn with_line(key: &str, line: &'static str) -> Vec<&'static str> {
        minimal()
            .into_iter()
            .map(|l| if l.starts_with(key) { line } else { l })
            .collect()
    }

    #[test]
    fn non_positive_or_non_finite_dt_is_format_error() {
        for line in ["DT=0", "DT=-0.01", "DT=NaN", "DT=inf"] {
            let err = parse_header(&block(&with_line("DT=", line), 256), 256).unwrap_err();
            assert!(matches!(err, EdrError::Format(ref m) if m.contains("DT")), "{line}");
        }
    }

    #[test]
    fn huge_channel_count_fails_on_missing_name() {
        let lines = with_line("NC=", "NC=4000000000000000000");
        let err = parse_header(&block(&lines, 256), 256).unwrap_err();
        // YN0 and YN1 exist, YN2 does not
        assert!(matches!(err, EdrError::Format(ref m) if m.contains("YN2")));
    }

    #[test]
    fn negative_adc_max_is_format_error() {
        let lines = with_line("ADCMAX=", "ADCMAX=-1");
        assert!(matches!(parse_header(&block(&lines, 256), 256), Err(EdrError::Format(_))));
    }

    #[test]
    fn line_without_separator_is_format_error() {
        let mut lines = minimal();
        lines.insert(2, "garbage line");
        assert!(matches!(parse_header(&block(&lines, 256), 256), Err(EdrError::Format(_))));

        let mut lines = minimal();
        lines.insert(2, "A=B=C");
        assert!(matches!(parse_header(&block(&lines, 256), 256), Err(EdrError::Format(_))));
    }

    #[test]
    fn line_crossing_block_boundary_is_not_parsed() {
        let mut bytes: Vec<u8> = minimal().iter().flat_map(|l| format!("{l}\n").into_bytes()).collect();
        let block_size = bytes.len();
        // runs past the block: would be a malformed line if it were parsed
        bytes.extend_from_slice(b"no separator here\n");
        let header = parse_header(&bytes, block_size).unwrap();
        assert_eq!(header.n_channels, 2);
    }

    #[test]
    fn line_ending_exactly_at_boundary_is_parsed() {
        let mut lines = minimal();
        lines.push("EXTRA=7");
        let bytes: Vec<u8> = lines.iter().flat_map(|l| format!("{l}\n").into_bytes()).collect();
        let header = parse_header(&bytes, bytes.len()).unwrap();
        assert_eq!(header.get("EXTRA"), Some(&HeaderValue::Integer(7)));
    }

    #[test]
    fn parses_ctime() {
        let start = parse_file_start("06-12-2015 01:36:59 PM").unwrap();
        assert_eq!((start.year(), start.month(), start.day()), (2015, 6, 12));
        assert_eq!((start.hour(), start.minute(), start.second()), (13, 36, 59));
        assert!(matches!(parse_file_start("2015-06-12 13:36:59"), Err(EdrError::Format(_))));
    }
}
