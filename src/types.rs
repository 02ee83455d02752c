//! Common types, errors, and constants for waveform file operations

use num_complex::Complex64;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Default cap on the header scan, in bytes.
///
/// Variable declaration headers are normally a few hundred bytes; a header
/// that has not terminated within 1 MiB is treated as a hard error and the
/// caller must re-invoke with a larger cap.
pub const MAX_HEADER_SIZE: usize = 1_000_000;

/// Metadata tags recognized in the header section, matched by literal prefix.
pub const HEADER_TAGS: [&str; 7] = [
    "Title:",
    "Date:",
    "Plotname:",
    "Flags:",
    "No. Variables:",
    "No. Points:",
    "Offset:",
];

// ============================================================================
// Enums
// ============================================================================

/// Text encoding of the header section, detected from raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf16Le,
    Utf8,
}

/// Container kind of the data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Binary,
    Ascii,
}

/// Simulation mode, derived from the plot-name field.
///
/// The mode decides whether samples are real or complex and whether the
/// independent axis is time or frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Transient,
    AC,
    DC,
    Noise,
    FFT,
    OperatingPoint,
}

impl SimulationMode {
    /// Modes whose dependent samples are complex pairs.
    #[inline]
    pub fn is_complex(self) -> bool {
        matches!(self, SimulationMode::AC | SimulationMode::FFT)
    }

    /// Modes whose independent axis is time.
    #[inline]
    pub fn has_time_axis(self) -> bool {
        matches!(self, SimulationMode::Transient | SimulationMode::DC)
    }

    /// Modes whose independent axis is frequency.
    #[inline]
    pub fn has_frequency_axis(self) -> bool {
        matches!(
            self,
            SimulationMode::AC | SimulationMode::FFT | SimulationMode::Noise
        )
    }
}

/// On-disk sample representation for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// 4-byte little-endian float
    F32,
    /// 8-byte little-endian float
    F64,
    /// Two 8-byte little-endian floats (real, imaginary)
    Complex128,
}

impl SampleType {
    /// Record width in bytes.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            SampleType::F32 => 4,
            SampleType::F64 => 8,
            SampleType::Complex128 => 16,
        }
    }
}

/// Decoded sample column - either real or complex.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl VectorData {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            VectorData::Real(v) => v.len(),
            VectorData::Complex(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for waveform reading and measurement operations.
///
/// Load-time variants (encoding, header, size) are fatal to the decode call;
/// per-query variants (missing signal, empty sequence) leave a decoded
/// document usable for further queries.
#[derive(Debug, Error)]
pub enum WaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("header is neither valid UTF-16LE nor UTF-8")]
    UnknownEncoding,

    #[error("header did not terminate within {0} bytes, raise the header cap")]
    HeaderTooLarge(usize),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("unrecognized container kind in header line {0:?}")]
    UnrecognizedContainer(String),

    #[error("data section size mismatch: expected {expected}, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("malformed sample value {0:?}")]
    InvalidSample(String),

    #[error("invalid metric notation {0:?}")]
    InvalidNotation(String),

    #[error("invalid signal expression {0:?}")]
    InvalidSignalExpression(String),

    #[error("reference node {node:?} of {expr:?} is missing from the file")]
    MissingReferenceNode { expr: String, node: String },

    #[error("signal {0:?} not found")]
    SignalNotFound(String),

    #[error("empty sample sequence")]
    EmptySequence,

    #[error("signal {0:?} is complex-valued, measurement requires real samples")]
    ComplexSignal(String),

    #[error("{axis} axis is not defined for {mode:?} analysis")]
    AxisUnavailable {
        axis: &'static str,
        mode: SimulationMode,
    },

    #[error("case index {index} out of range ({count} cases)")]
    CaseOutOfRange { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, WaveError>;

// ============================================================================
// Data Structures
// ============================================================================

/// One declared variable from the header's `Variables:` block.
///
/// The first entry is always the independent variable (time or frequency).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    /// Type tag as declared in the file (e.g. "voltage", "device_current").
    /// Unknown tags are preserved but not interpreted.
    pub var_type: String,
}

/// Parsed header of a waveform file.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub title: String,
    pub date: String,
    pub plot_name: String,
    /// Flag tokens as declared (e.g. "real", "complex", "double").
    pub flags: Vec<String>,
    /// Declared variable count; always equals `variables.len()`.
    pub variable_count: usize,
    /// Declared point count across all sweep cases.
    pub point_count: usize,
    /// Declared offset field; rarely non-zero.
    pub offset: f64,
    pub variables: Vec<VariableSpec>,
    pub container: ContainerKind,
    pub encoding: TextEncoding,
    /// Independent-axis sample width.
    pub x_type: SampleType,
    /// Dependent-axis sample width.
    pub y_type: SampleType,
    pub mode: SimulationMode,
    /// Byte offset of the data section, just past the terminator newline.
    pub data_offset: usize,
}

/// Half-open point range of one sweep case.
///
/// Repeated sweeps are concatenated without delimiters; cases are contiguous,
/// non-overlapping, and cover the full point range in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Case {
    pub start: usize,
    pub end: usize,
}

impl Case {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
