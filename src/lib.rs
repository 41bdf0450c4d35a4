//! Decoding and segmentation of arena EDR telemetry recordings.
//!
//! The entry points most callers need are [`data::loader::load_file`],
//! [`data::model::Recording::split`] and [`data::trial::load_trial`].

pub mod data;

pub use data::error::{EdrError, Result};
pub use data::loader::{decode, load_file, HEADER_BLOCK_SIZE};
pub use data::model::{DecodedEdr, ExcludedInterval, Recording, Segment};
pub use data::options::{ChannelRoles, DecodeOptions};
pub use data::segment::{extract_segments, DEFAULT_MIN_SEGMENT_LENGTH};
