use serde::{Deserialize, Serialize};

use super::error::{EdrError, Result};

// ---------------------------------------------------------------------------
// Channel roles used by the post-processing transforms
// ---------------------------------------------------------------------------

/// Which channels the derived-signal transforms read and write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelRoles {
    /// Left wing-beat amplitude.
    pub left: String,
    /// Right wing-beat amplitude.
    pub right: String,
    /// Channel overwritten with the z-scored left-minus-right difference.
    pub difference: String,
    /// Bar position, recorded in volts.
    pub bar_position: String,
}

impl Default for ChannelRoles {
    fn default() -> Self {
        Self {
            left: "Lamp".to_string(),
            right: "Ramp".to_string(),
            difference: "LmR".to_string(),
            bar_position: "Barpos".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode options
// ---------------------------------------------------------------------------

/// Optional stages of a decode call. Everything is off by default.
///
/// Loadable from JSON, e.g.
/// ```json
/// { "target_dt": 0.01, "apply_lmr_zscore": true, "roles": { "bar_position": "Bar" } }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Decimate to this interval (seconds) when coarser than the native one.
    pub target_dt: Option<f64>,
    pub apply_lmr_zscore: bool,
    pub apply_barpos_degrees: bool,
    pub apply_barpos_unwrap: bool,
    pub roles: ChannelRoles,
}

impl DecodeOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        let options: DecodeOptions = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        match self.target_dt {
            Some(dt) if !dt.is_finite() || dt < 0.0 => Err(EdrError::invalid(format!(
                "target_dt must be a finite, non-negative number of seconds, got {dt}"
            ))),
            _ => Ok(()),
        }
    }
}
