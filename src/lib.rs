//! # rawave - SPICE Waveform Reader and Measurements
//!
//! A library for reading circuit-simulation waveform dumps and computing
//! standard electrical measurements over the recorded signals.
//!
//! ## Supported Formats
//!
//! - SPICE raw binary containers (mixed f64/f32 records, double-precision
//!   and complex layouts)
//! - SPICE raw ASCII containers (`Values:` sections, real and complex)
//! - UTF-16LE and UTF-8 headers, detected from raw bytes
//!
//! ## Features
//!
//! - Memory-mapped one-shot file read; all parsing works on byte slices
//! - Sweep-case recovery for stepped runs concatenated in one buffer
//! - Single-ended and differential signal resolution with interpolation
//! - Peak / peak-to-peak / RMS / average measurements in engineering
//!   (metric-prefix) notation
//! - Structured logging via `tracing` for diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rawave::{read, Meter, Statistic, OutputMode};
//!
//! let doc = read("lowpass.raw").unwrap();
//! println!("Title: {}", doc.descriptor.title);
//! println!("Cases: {}", doc.case_count());
//!
//! let meter = Meter::new(&doc);
//! let ripple = meter.peak_to_peak("V(out)").unwrap();
//! println!("ripple: {}", rawave::to_metric(ripple, 2));
//!
//! // Differential probe, formatted for a results table
//! let row = meter
//!     .measure("V(n003, n005)", Statistic::TrueRms, OutputMode::Table)
//!     .unwrap();
//! ```
//!
//! ## Enabling Logging
//!
//! This library uses `tracing` for structured logging. To see log output,
//! initialize a tracing subscriber in your application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! let doc = rawave::read("lowpass.raw").unwrap();
//! ```

mod decode;
mod document;
mod header;
mod measure;
mod metric;
mod signal;
mod types;

pub use document::WaveformDocument;
pub use measure::{Meter, OutputMode, Reading, Statistic, TableRow};
pub use metric::{from_metric, to_metric};
pub use signal::{interp, SignalKind, SignalReference};
pub use types::{
    Case, ContainerKind, FileDescriptor, Result, SampleType, SimulationMode, TextEncoding,
    VariableSpec, VectorData, WaveError, MAX_HEADER_SIZE,
};

// Re-export header parsing for advanced use
pub use header::parse_header;

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::instrument;

/// Read and decode a waveform file.
///
/// The file is memory-mapped and decoded in one shot; the returned
/// [`WaveformDocument`] is immutable and owns all decoded samples.
///
/// # Example
/// ```rust,no_run
/// let doc = rawave::read("lowpass.raw").unwrap();
/// if let Some(out) = doc.signal("V(out)", 0).unwrap() {
///     println!("V(out): {} points", out.len());
/// }
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> Result<WaveformDocument> {
    read_with_header_cap(path, MAX_HEADER_SIZE)
}

/// Read with an explicit header-scan byte cap.
///
/// [`WaveError::HeaderTooLarge`] from [`read`] means the variable
/// declaration header did not terminate within the default 1 MiB cap;
/// re-invoke through this entry point with a larger cap.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_with_header_cap<P: AsRef<Path>>(path: P, header_cap: usize) -> Result<WaveformDocument> {
    let file = File::open(path.as_ref())?;
    let mmap = unsafe { Mmap::map(&file)? };
    WaveformDocument::parse_with_header_cap(&mmap, header_cap)
}
