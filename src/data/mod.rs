/// Data layer: EDR decoding, calibration, resampling and segmentation.
///
/// Architecture:
/// ```text
///   .edr bytes
///        │
///        ▼
///   ┌──────────┐
///   │  header   │  2048-byte ASCII block → Header (typed KEY=VALUE)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  samples  │  i16 LE interleaved → channel columns, calibrate, fix-up
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ timebase  │  prepend time column, optional decimation
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ transform │  z-score difference, bar position degrees / unwrap
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  segment  │  excluded intervals → kept row ranges
///   └──────────┘
/// ```
///
/// `loader` wires the stages together, `trial` resolves trial records against
/// a data directory, `export` writes recordings back out as CSV/JSON/Parquet.

pub mod error;
pub mod export;
pub mod header;
pub mod loader;
pub mod model;
pub mod options;
pub mod samples;
pub mod segment;
pub mod timebase;
pub mod transform;
pub mod trial;
pub mod writer;
