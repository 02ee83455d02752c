//! Decoded waveform document
//!
//! A [`WaveformDocument`] is built once from file bytes and is read-only
//! afterwards; it is safe to share across concurrent readers without
//! synchronization. Signal resolution and measurement run repeatedly
//! against it per query.

use crate::decode;
use crate::header;
use crate::signal::{self, SignalKind, SignalReference};
use crate::types::{
    Case, FileDescriptor, Result, VariableSpec, VectorData, WaveError, MAX_HEADER_SIZE,
};
use tracing::info;

/// One fully decoded waveform file.
#[derive(Debug)]
pub struct WaveformDocument {
    pub descriptor: FileDescriptor,
    /// One column per declared variable; column 0 is the independent axis.
    pub columns: Vec<VectorData>,
    /// Real independent-axis vector across all cases.
    pub scale: Vec<f64>,
    /// Sweep cases partitioning the point range, in ascending order.
    pub cases: Vec<Case>,
}

impl WaveformDocument {
    /// Decode a document from raw file bytes with the default header cap.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_header_cap(bytes, MAX_HEADER_SIZE)
    }

    /// Decode with an explicit header-scan byte cap.
    pub fn parse_with_header_cap(bytes: &[u8], header_cap: usize) -> Result<Self> {
        let mut descriptor = header::parse_header(bytes, header_cap)?;
        let decoded = decode::decode(bytes, &mut descriptor)?;
        let cases = decode::split_cases(&decoded.scale);

        info!(
            title = %descriptor.title,
            mode = ?descriptor.mode,
            points = decoded.scale.len(),
            cases = cases.len(),
            "waveform decoded"
        );

        Ok(Self {
            descriptor,
            columns: decoded.columns,
            scale: decoded.scale,
            cases,
        })
    }

    #[inline]
    pub fn variables(&self) -> &[VariableSpec] {
        &self.descriptor.variables
    }

    #[inline]
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    fn case(&self, index: usize) -> Result<Case> {
        self.cases
            .get(index)
            .copied()
            .ok_or(WaveError::CaseOutOfRange {
                index,
                count: self.cases.len(),
            })
    }

    /// Independent-axis samples of one case.
    pub fn x(&self, case: usize) -> Result<&[f64]> {
        let range = self.case(case)?;
        Ok(&self.scale[range.start..range.end])
    }

    /// Time axis of one case; only Transient and DC sweeps carry one.
    pub fn time(&self, case: usize) -> Result<&[f64]> {
        if !self.descriptor.mode.has_time_axis() {
            return Err(WaveError::AxisUnavailable {
                axis: "time",
                mode: self.descriptor.mode,
            });
        }
        self.x(case)
    }

    /// Frequency axis of one case; only AC, FFT and Noise sweeps carry one.
    pub fn frequency(&self, case: usize) -> Result<Vec<f64>> {
        if !self.descriptor.mode.has_frequency_axis() {
            return Err(WaveError::AxisUnavailable {
                axis: "frequency",
                mode: self.descriptor.mode,
            });
        }
        Ok(self.x(case)?.iter().map(|x| x.abs()).collect())
    }

    /// Case-insensitive exact lookup of a variable by its declared name.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.descriptor
            .variables
            .iter()
            .position(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a signal expression to its sample sequence for one case.
    pub fn signal(&self, expr: &str, case: usize) -> Result<Option<VectorData>> {
        self.resolve(&SignalReference::parse(expr)?, case)
    }

    /// Resolve a parsed reference for one case.
    ///
    /// A single-ended reference that is absent from the variable list is
    /// `Ok(None)`, not a hard failure; the caller decides whether absence is
    /// fatal. A differential reference with either side missing fails with
    /// [`WaveError::MissingReferenceNode`].
    pub fn resolve(&self, reference: &SignalReference, case: usize) -> Result<Option<VectorData>> {
        let range = self.case(case)?;

        match reference {
            SignalReference::SingleEnded { .. } => {
                Ok(self
                    .variable_index(&reference.to_string())
                    .map(|index| self.column_slice(index, range)))
            }
            SignalReference::Differential { node_pos, node_neg } => {
                let positive = self.node_slice(reference, node_pos, range)?;
                let negative = self.node_slice(reference, node_neg, range)?;
                Ok(Some(subtract(reference, positive, negative)?))
            }
        }
    }

    /// Resolve a real signal against query time/frequency points, linearly
    /// interpolated over the case's own axis with boundary clamping.
    pub fn signal_at(&self, expr: &str, case: usize, query: &[f64]) -> Result<Option<Vec<f64>>> {
        let reference = SignalReference::parse(expr)?;
        let samples = match self.resolve(&reference, case)? {
            Some(VectorData::Real(samples)) => samples,
            Some(VectorData::Complex(_)) => {
                return Err(WaveError::ComplexSignal(reference.to_string()));
            }
            None => return Ok(None),
        };

        let axis: Vec<f64> = if self.descriptor.mode.has_frequency_axis() {
            self.frequency(case)?
        } else {
            self.time(case)?.to_vec()
        };
        if axis.is_empty() {
            return Err(WaveError::EmptySequence);
        }

        Ok(Some(signal::interp(query, &axis, &samples)))
    }

    fn node_slice(
        &self,
        reference: &SignalReference,
        node: &str,
        range: Case,
    ) -> Result<VectorData> {
        let single = SignalReference::SingleEnded {
            kind: SignalKind::Voltage,
            node: node.to_string(),
        };
        self.variable_index(&single.to_string())
            .map(|index| self.column_slice(index, range))
            .ok_or_else(|| WaveError::MissingReferenceNode {
                expr: reference.to_string(),
                node: node.to_string(),
            })
    }

    fn column_slice(&self, index: usize, range: Case) -> VectorData {
        match &self.columns[index] {
            VectorData::Real(values) => VectorData::Real(values[range.start..range.end].to_vec()),
            VectorData::Complex(values) => {
                VectorData::Complex(values[range.start..range.end].to_vec())
            }
        }
    }
}

/// Elementwise difference of two resolved node sequences.
fn subtract(reference: &SignalReference, pos: VectorData, neg: VectorData) -> Result<VectorData> {
    match (pos, neg) {
        (VectorData::Real(p), VectorData::Real(n)) => Ok(VectorData::Real(
            p.iter().zip(&n).map(|(a, b)| a - b).collect(),
        )),
        (VectorData::Complex(p), VectorData::Complex(n)) => Ok(VectorData::Complex(
            p.iter().zip(&n).map(|(a, b)| a - b).collect(),
        )),
        // Columns of one document share a dtype; a mix means the reference
        // straddles the independent axis, which measurement cannot use.
        _ => Err(WaveError::ComplexSignal(reference.to_string())),
    }
}
