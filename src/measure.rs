//! Measurement engine
//!
//! Standard electrical measurements over a resolved real-valued sample
//! sequence, rendered raw, in metric notation, as a print line, or as a
//! table row. The computation itself is pure; the side-effecting print
//! lives only in [`Meter::report`].

use crate::document::WaveformDocument;
use crate::metric::to_metric;
use crate::signal::SignalReference;
use crate::types::{Result, VectorData, WaveError};

/// Precision used for metric-formatted measurement output.
const METRIC_PRECISION: usize = 2;

/// A named statistic over a sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Peak,
    PeakToPeak,
    TrueRms,
    PeakRms,
    PeakToPeakRms,
    Average,
}

impl Statistic {
    /// Human label used in print and table output.
    pub fn label(self) -> &'static str {
        match self {
            Statistic::Peak => "Peak",
            Statistic::PeakToPeak => "Peak to Peak",
            Statistic::TrueRms => "True RMS",
            Statistic::PeakRms => "Peak RMS",
            Statistic::PeakToPeakRms => "Peak to Peak RMS",
            Statistic::Average => "Average",
        }
    }

    /// Compute the statistic over one sample sequence.
    pub fn compute(self, samples: &[f64]) -> Result<f64> {
        if samples.is_empty() {
            return Err(WaveError::EmptySequence);
        }

        let value = match self {
            Statistic::Peak => peak(samples),
            Statistic::PeakToPeak => peak_to_peak(samples),
            Statistic::TrueRms => {
                let mean_square =
                    samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64;
                mean_square.sqrt()
            }
            Statistic::PeakRms => peak(samples) / 2f64.sqrt(),
            Statistic::PeakToPeakRms => peak_to_peak(samples) / (2.0 * 2f64.sqrt()),
            Statistic::Average => samples.iter().sum::<f64>() / samples.len() as f64,
        };

        Ok(value)
    }
}

fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(f64::NEG_INFINITY, |m, x| m.max(x.abs()))
}

fn peak_to_peak(samples: &[f64]) -> f64 {
    let max = samples.iter().fold(f64::NEG_INFINITY, |m, &x| m.max(x));
    let min = samples.iter().fold(f64::INFINITY, |m, &x| m.min(x));
    max - min
}

/// Output rendering of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw double.
    Raw,
    /// Metric-notation string at precision 2.
    Metric,
    /// A `signal: value+unit label` line prepared for printing.
    Print,
    /// `(signal, value+unit, label)` row for tabular aggregation.
    Table,
}

/// One row of tabular measurement output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub signal: String,
    /// Metric-formatted value with the unit letter appended, e.g. `"3.30kV"`.
    pub value: String,
    pub label: &'static str,
}

/// Result of a measurement in the requested output mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Raw(f64),
    Metric(String),
    Line(String),
    Table(TableRow),
}

/// Measurement engine over one document and sweep case.
pub struct Meter<'a> {
    doc: &'a WaveformDocument,
    case: usize,
}

impl<'a> Meter<'a> {
    /// Measure against the first sweep case.
    pub fn new(doc: &'a WaveformDocument) -> Self {
        Self { doc, case: 0 }
    }

    pub fn with_case(doc: &'a WaveformDocument, case: usize) -> Self {
        Self { doc, case }
    }

    /// Compute a statistic for a signal expression in the requested mode.
    pub fn measure(&self, expr: &str, stat: Statistic, output: OutputMode) -> Result<Reading> {
        let (reference, samples) = self.resolved(expr)?;
        let value = stat.compute(&samples)?;

        Ok(match output {
            OutputMode::Raw => Reading::Raw(value),
            OutputMode::Metric => Reading::Metric(to_metric(value, METRIC_PRECISION)),
            OutputMode::Print => Reading::Line(format!(
                "{}: {}{} {}",
                reference,
                to_metric(value, METRIC_PRECISION),
                reference.kind().unit_symbol(),
                stat.label()
            )),
            OutputMode::Table => Reading::Table(TableRow {
                signal: reference.to_string(),
                value: format!(
                    "{}{}",
                    to_metric(value, METRIC_PRECISION),
                    reference.kind().unit_symbol()
                ),
                label: stat.label(),
            }),
        })
    }

    /// Compute the raw value of a statistic.
    pub fn value(&self, expr: &str, stat: Statistic) -> Result<f64> {
        let (_, samples) = self.resolved(expr)?;
        stat.compute(&samples)
    }

    /// Print one measurement line to stdout.
    pub fn report(&self, expr: &str, stat: Statistic) -> Result<()> {
        if let Reading::Line(line) = self.measure(expr, stat, OutputMode::Print)? {
            println!("{line}");
        }
        Ok(())
    }

    pub fn peak(&self, expr: &str) -> Result<f64> {
        self.value(expr, Statistic::Peak)
    }

    pub fn peak_to_peak(&self, expr: &str) -> Result<f64> {
        self.value(expr, Statistic::PeakToPeak)
    }

    pub fn true_rms(&self, expr: &str) -> Result<f64> {
        self.value(expr, Statistic::TrueRms)
    }

    pub fn peak_rms(&self, expr: &str) -> Result<f64> {
        self.value(expr, Statistic::PeakRms)
    }

    pub fn peak_to_peak_rms(&self, expr: &str) -> Result<f64> {
        self.value(expr, Statistic::PeakToPeakRms)
    }

    pub fn average(&self, expr: &str) -> Result<f64> {
        self.value(expr, Statistic::Average)
    }

    fn resolved(&self, expr: &str) -> Result<(SignalReference, Vec<f64>)> {
        let reference = SignalReference::parse(expr)?;
        let data = self
            .doc
            .resolve(&reference, self.case)?
            .ok_or_else(|| WaveError::SignalNotFound(reference.to_string()))?;

        match data {
            VectorData::Real(samples) => Ok((reference, samples)),
            VectorData::Complex(_) => Err(WaveError::ComplexSignal(reference.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::split_cases;
    use crate::types::{
        ContainerKind, FileDescriptor, SampleType, SimulationMode, TextEncoding, VariableSpec,
    };

    fn doc_with(samples: Vec<f64>) -> WaveformDocument {
        let scale: Vec<f64> = (0..samples.len()).map(|i| i as f64).collect();
        let cases = split_cases(&scale);
        WaveformDocument {
            descriptor: FileDescriptor {
                title: String::new(),
                date: String::new(),
                plot_name: "Transient Analysis".into(),
                flags: vec!["real".into()],
                variable_count: 2,
                point_count: samples.len(),
                offset: 0.0,
                variables: vec![
                    VariableSpec {
                        name: "time".into(),
                        var_type: "time".into(),
                    },
                    VariableSpec {
                        name: "V(a)".into(),
                        var_type: "voltage".into(),
                    },
                ],
                container: ContainerKind::Binary,
                encoding: TextEncoding::Utf8,
                x_type: SampleType::F64,
                y_type: SampleType::F32,
                mode: SimulationMode::Transient,
                data_offset: 0,
            },
            columns: vec![
                VectorData::Real(scale.clone()),
                VectorData::Real(samples),
            ],
            scale,
            cases,
        }
    }

    #[test]
    fn test_statistics_reference_sequence() {
        let doc = doc_with(vec![-3.0, 1.0, 2.0, -1.0]);
        let meter = Meter::new(&doc);

        assert_eq!(meter.peak("V(a)").unwrap(), 3.0);
        assert_eq!(meter.peak_to_peak("V(a)").unwrap(), 5.0);
        assert_eq!(meter.average("V(a)").unwrap(), -0.25);
        assert!((meter.true_rms("V(a)").unwrap() - 3.75f64.sqrt()).abs() < 1e-12);
        assert!((meter.peak_rms("V(a)").unwrap() - 3.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!(
            (meter.peak_to_peak_rms("V(a)").unwrap() - 5.0 / (2.0 * 2f64.sqrt())).abs() < 1e-12
        );
    }

    #[test]
    fn test_metric_output() {
        let doc = doc_with(vec![-3.0, 1.0, 2.0, -1.0]);
        let meter = Meter::new(&doc);

        assert_eq!(
            meter
                .measure("V(a)", Statistic::Peak, OutputMode::Metric)
                .unwrap(),
            Reading::Metric("3.00".into())
        );
    }

    #[test]
    fn test_print_line() {
        let doc = doc_with(vec![-3.0, 1.0, 2.0, -1.0]);
        let meter = Meter::new(&doc);

        assert_eq!(
            meter
                .measure("V(a)", Statistic::PeakToPeak, OutputMode::Print)
                .unwrap(),
            Reading::Line("V(a): 5.00V Peak to Peak".into())
        );
    }

    #[test]
    fn test_table_row() {
        let doc = doc_with(vec![0.0, 0.047, -0.047, 0.0]);
        let meter = Meter::new(&doc);

        assert_eq!(
            meter
                .measure("V(a)", Statistic::Peak, OutputMode::Table)
                .unwrap(),
            Reading::Table(TableRow {
                signal: "V(a)".into(),
                value: "47.00mV".into(),
                label: "Peak",
            })
        );
    }

    #[test]
    fn test_missing_signal_is_hard_here() {
        let doc = doc_with(vec![1.0]);
        let meter = Meter::new(&doc);
        match meter.peak("V(zz)") {
            Err(WaveError::SignalNotFound(name)) => assert_eq!(name, "V(zz)"),
            other => panic!("expected SignalNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_sequence() {
        assert!(matches!(
            Statistic::Average.compute(&[]),
            Err(WaveError::EmptySequence)
        ));
    }
}
