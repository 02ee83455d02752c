//! Sample decoder
//!
//! Turns the data section of a waveform file into per-variable sample
//! columns, then partitions the point range into sweep cases.
//!
//! All binary decoding goes through one explicit little-endian cursor
//! (`byteorder::ReadBytesExt`); the byte buffer is never reinterpreted
//! in place.

use crate::types::{
    Case, ContainerKind, FileDescriptor, Result, SampleType, SimulationMode, TextEncoding,
    VectorData, WaveError,
};
use byteorder::{LittleEndian, ReadBytesExt};
use num_complex::Complex64;
use tracing::{debug, warn};

/// Decoded data section: one column per declared variable plus a real view
/// of the independent axis.
#[derive(Debug)]
pub struct DecodedData {
    /// Column 0 is the independent variable, exactly as stored in the file.
    pub columns: Vec<VectorData>,
    /// Real independent-axis vector. Transient/AC/FFT report |x| here since
    /// simulation time and frequency are always non-negative even when the
    /// container encodes a sign bit for internal bookkeeping.
    pub scale: Vec<f64>,
}

/// Decode the data section of `bytes` according to the descriptor.
///
/// May upgrade `desc.y_type` in place when the binary payload length reveals
/// double-precision dependent samples.
pub fn decode(bytes: &[u8], desc: &mut FileDescriptor) -> Result<DecodedData> {
    if desc.variable_count == 0 {
        return Err(WaveError::MalformedHeader("no variables declared".into()));
    }

    let columns = match desc.container {
        ContainerKind::Binary => decode_binary(bytes, desc)?,
        ContainerKind::Ascii => decode_ascii(bytes, desc)?,
    };

    let scale = scale_vector(&columns[0], desc.mode);
    debug!(
        points = scale.len(),
        columns = columns.len(),
        "data section decoded"
    );

    Ok(DecodedData { columns, scale })
}

// ============================================================================
// Binary container
// ============================================================================

fn decode_binary(bytes: &[u8], desc: &mut FileDescriptor) -> Result<Vec<VectorData>> {
    let points = desc.point_count;
    let nvars = desc.variable_count;
    let data = bytes.get(desc.data_offset..).unwrap_or(&[]);

    let x_size = desc.x_type.size();
    let expected = points * (nvars - 1) * desc.y_type.size() + points * x_size;

    if data.len() != expected {
        // Alternate hypothesis: dependent samples are actually doubles even
        // though the flags did not say so.
        let double_len = points * (nvars - 1) * SampleType::F64.size() + points * x_size;
        if desc.y_type == SampleType::F32 && data.len() == double_len {
            warn!("dependent sample width detected as double precision, upgrading layout");
            desc.y_type = SampleType::F64;
        } else {
            return Err(WaveError::SizeMismatch {
                expected,
                found: data.len(),
            });
        }
    }

    if desc.x_type == desc.y_type {
        decode_uniform(data, desc.x_type, points, nvars)
    } else {
        decode_mixed(data, points, nvars)
    }
}

/// Uniform record layout: a flat row-major array of `points * nvars` samples,
/// column 0 being the independent variable.
fn decode_uniform(
    data: &[u8],
    sample_type: SampleType,
    points: usize,
    nvars: usize,
) -> Result<Vec<VectorData>> {
    let mut cursor = data;

    match sample_type {
        SampleType::Complex128 => {
            let mut columns: Vec<Vec<Complex64>> = vec![Vec::with_capacity(points); nvars];
            for _ in 0..points {
                for column in columns.iter_mut() {
                    let re = cursor.read_f64::<LittleEndian>()?;
                    let im = cursor.read_f64::<LittleEndian>()?;
                    column.push(Complex64::new(re, im));
                }
            }
            Ok(columns.into_iter().map(VectorData::Complex).collect())
        }
        SampleType::F64 => {
            let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(points); nvars];
            for _ in 0..points {
                for column in columns.iter_mut() {
                    column.push(cursor.read_f64::<LittleEndian>()?);
                }
            }
            Ok(columns.into_iter().map(VectorData::Real).collect())
        }
        SampleType::F32 => {
            let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(points); nvars];
            for _ in 0..points {
                for column in columns.iter_mut() {
                    column.push(cursor.read_f32::<LittleEndian>()? as f64);
                }
            }
            Ok(columns.into_iter().map(VectorData::Real).collect())
        }
    }
}

/// Mixed-precision record layout, the common case for real transient data:
/// each per-point record holds one wide (8-byte) independent value followed
/// by `nvars - 1` narrow (4-byte) dependent samples.
fn decode_mixed(data: &[u8], points: usize, nvars: usize) -> Result<Vec<VectorData>> {
    let mut cursor = data;
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(points); nvars];

    for _ in 0..points {
        columns[0].push(cursor.read_f64::<LittleEndian>()?);
        for column in columns.iter_mut().skip(1) {
            column.push(cursor.read_f32::<LittleEndian>()? as f64);
        }
    }

    Ok(columns.into_iter().map(VectorData::Real).collect())
}

// ============================================================================
// Ascii container
// ============================================================================

fn decode_ascii(bytes: &[u8], desc: &FileDescriptor) -> Result<Vec<VectorData>> {
    let points = desc.point_count;
    let nvars = desc.variable_count;
    let text = decode_text(bytes, desc.encoding)?;

    let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).collect();
    let values_at = lines
        .iter()
        .position(|&l| l == "Values:")
        .ok_or_else(|| WaveError::MalformedHeader("missing Values: line".into()))?;
    let records: Vec<&str> = lines[values_at + 1..]
        .iter()
        .copied()
        .filter(|l| !l.is_empty())
        .collect();

    let expected = points * nvars;
    if records.len() != expected {
        return Err(WaveError::SizeMismatch {
            expected,
            found: records.len(),
        });
    }

    // The first record of each point carries the point index before a tab;
    // the sample value is always the last tab-delimited field per line.
    if desc.y_type == SampleType::Complex128 {
        let mut columns: Vec<Vec<Complex64>> = vec![Vec::with_capacity(points); nvars];
        for (k, record) in records.iter().enumerate() {
            let field = last_field(record);
            let (re, im) = field
                .split_once(',')
                .ok_or_else(|| WaveError::InvalidSample(field.to_string()))?;
            let sample = Complex64::new(parse_sample(re)?, parse_sample(im)?);
            columns[k % nvars].push(sample);
        }
        Ok(columns.into_iter().map(VectorData::Complex).collect())
    } else {
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(points); nvars];
        for (k, record) in records.iter().enumerate() {
            columns[k % nvars].push(parse_sample(last_field(record))?);
        }
        Ok(columns.into_iter().map(VectorData::Real).collect())
    }
}

fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| WaveError::UnknownEncoding),
        TextEncoding::Utf16Le => {
            if bytes.len() % 2 != 0 {
                return Err(WaveError::UnknownEncoding);
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|_| WaveError::UnknownEncoding)
        }
    }
}

fn last_field(record: &str) -> &str {
    record.rsplit('\t').next().unwrap_or(record).trim()
}

fn parse_sample(field: &str) -> Result<f64> {
    field
        .trim()
        .parse()
        .map_err(|_| WaveError::InvalidSample(field.to_string()))
}

// ============================================================================
// Case splitter
// ============================================================================

/// Partition the independent-variable vector into sweep cases.
///
/// The first sample is the sweep-restart sentinel; every later sample exactly
/// equal to it starts a new case. Exact floating-point equality is the
/// contract: restart values computed rather than written literally are not
/// guaranteed to split.
pub fn split_cases(scale: &[f64]) -> Vec<Case> {
    if scale.is_empty() {
        return Vec::new();
    }

    let sentinel = scale[0];
    let mut boundaries = vec![0usize];
    for i in 0..scale.len() - 1 {
        if scale[i + 1] == sentinel {
            boundaries.push(i + 1);
        }
    }
    boundaries.push(scale.len());

    boundaries
        .windows(2)
        .map(|pair| Case {
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

fn scale_vector(column: &VectorData, mode: SimulationMode) -> Vec<f64> {
    match column {
        VectorData::Real(values) => {
            if matches!(
                mode,
                SimulationMode::Transient | SimulationMode::AC | SimulationMode::FFT
            ) {
                values.iter().map(|x| x.abs()).collect()
            } else {
                values.clone()
            }
        }
        VectorData::Complex(values) => values.iter().map(|c| c.norm()).collect(),
    }
}
