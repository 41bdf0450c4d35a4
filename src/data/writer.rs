use std::path::Path;

use super::error::{EdrError, Result};
use super::loader::HEADER_BLOCK_SIZE;

// ---------------------------------------------------------------------------
// EdrWriter – produce EDR images (synthetic recordings, fixtures)
// ---------------------------------------------------------------------------

/// Builder for an EDR file: header keys, channel list, interleaved frames.
///
/// ```
/// use arena_edr::data::writer::EdrWriter;
///
/// let mut writer = EdrWriter::new(0.01, "06-12-2015 11:36:59 AM").channel("Lamp", 1.0);
/// writer.push_frame(&[42]).unwrap();
/// let bytes = writer.to_bytes().unwrap();
/// assert_eq!(bytes.len(), 2048 + 2);
/// ```
#[derive(Debug, Clone)]
pub struct EdrWriter {
    dt: f64,
    ad: f64,
    adc_max: i64,
    start_time: String,
    channels: Vec<(String, f64)>,
    extra: Vec<(String, String)>,
    samples: Vec<i16>,
}

impl EdrWriter {
    pub fn new(dt: f64, start_time: &str) -> Self {
        Self {
            dt,
            ad: 10.0,
            adc_max: 2047,
            start_time: start_time.to_string(),
            channels: Vec::new(),
            extra: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Add a channel with its name and calibration factor.
    pub fn channel(mut self, name: &str, calibration_factor: f64) -> Self {
        self.channels.push((name.to_string(), calibration_factor));
        self
    }

    pub fn ad(mut self, ad: f64) -> Self {
        self.ad = ad;
        self
    }

    pub fn adc_max(mut self, adc_max: i64) -> Self {
        self.adc_max = adc_max;
        self
    }

    /// Extra header line written after the standard keys.
    pub fn extra(mut self, key: &str, value: &str) -> Self {
        self.extra.push((key.to_string(), value.to_string()));
        self
    }

    /// Append one sample per channel.
    pub fn push_frame(&mut self, frame: &[i16]) -> Result<()> {
        if frame.len() != self.channels.len() {
            return Err(EdrError::invalid(format!(
                "frame has {} samples for {} channels",
                frame.len(),
                self.channels.len()
            )));
        }
        self.samples.extend_from_slice(frame);
        Ok(())
    }

    fn header_text(&self) -> String {
        let mut lines = vec![
            "VER=6.1".to_string(),
            format!("NBH={HEADER_BLOCK_SIZE}"),
            format!("NC={}", self.channels.len()),
            format!("NP={}", self.samples.len()),
            format!("AD={}", self.ad),
            format!("ADCMAX={}", self.adc_max),
            format!("DT={}", self.dt),
            format!("CTIME={}", self.start_time),
        ];
        for (ch, (name, ycf)) in self.channels.iter().enumerate() {
            lines.push(format!("YN{ch}={name}"));
            lines.push(format!("YCF{ch}={ycf}"));
        }
        lines.extend(self.extra.iter().map(|(k, v)| format!("{k}={v}")));
        lines.iter().map(|l| format!("{l}\r\n")).collect()
    }

    /// Serialize: NUL-padded header block, then little-endian samples.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = self.header_text();
        if header.len() > HEADER_BLOCK_SIZE {
            return Err(EdrError::invalid(format!(
                "header is {} bytes, larger than the {HEADER_BLOCK_SIZE}-byte block",
                header.len()
            )));
        }

        let mut bytes = Vec::with_capacity(HEADER_BLOCK_SIZE + 2 * self.samples.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.resize(HEADER_BLOCK_SIZE, 0);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(bytes)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}
