//! Waveform file header parser
//!
//! Detects the header text encoding from raw bytes, splits the header into
//! tagged metadata lines, and produces a [`FileDescriptor`]. Field order and
//! presence vary by simulation mode, so every tag is optional except the
//! `Variables:` block and the `Binary`/`Values` terminator.

use crate::types::{
    ContainerKind, FileDescriptor, Result, SampleType, SimulationMode, TextEncoding, VariableSpec,
    WaveError, HEADER_TAGS,
};
use tracing::debug;

/// Candidate decoders tried in order; first success wins. Absence of success
/// is a first-class error, never a silent default.
const ENCODING_CANDIDATES: [TextEncoding; 2] = [TextEncoding::Utf16Le, TextEncoding::Utf8];

/// Plot-name substrings checked in fixed priority order; first match wins.
const MODE_MARKERS: [(&str, SimulationMode); 6] = [
    ("FFT", SimulationMode::FFT),
    ("Transient", SimulationMode::Transient),
    ("AC", SimulationMode::AC),
    ("DC", SimulationMode::DC),
    ("Noise", SimulationMode::Noise),
    ("Operating Point", SimulationMode::OperatingPoint),
];

/// Outcome of scanning the capped buffer under one candidate encoding.
enum ScanOutcome {
    /// Decoded lines plus the byte offset just past the terminator newline.
    Lines(Vec<String>, usize),
    /// Invalid code unit; fall through to the next candidate.
    DecodeFailed,
    /// Ran off the end of the capped buffer before the terminator.
    Truncated,
}

fn decode_line(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf16Le => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(|s| s.to_string()),
    }
}

/// Scan byte-by-byte for newline markers, decoding each accumulated line,
/// until a line contains the `Binary` or `Values` terminator.
fn scan_lines(data: &[u8], encoding: TextEncoding) -> ScanOutcome {
    // UTF-16LE newlines carry a trailing 0x00 byte after the 0x0A marker.
    let newline_tail = match encoding {
        TextEncoding::Utf16Le => 2,
        TextEncoding::Utf8 => 1,
    };

    let mut lines = Vec::new();
    let mut begin = 0usize;
    let mut pos = 0usize;

    loop {
        if pos >= data.len() {
            return ScanOutcome::Truncated;
        }
        if data[pos] != b'\n' {
            pos += 1;
            continue;
        }

        let end = pos + newline_tail;
        if end > data.len() {
            return ScanOutcome::Truncated;
        }
        let line = match decode_line(&data[begin..end], encoding) {
            Some(line) => line,
            None => return ScanOutcome::DecodeFailed,
        };

        let terminated = line.contains("Binary") || line.contains("Values");
        lines.push(line);
        if terminated {
            return ScanOutcome::Lines(lines, end);
        }
        begin = end;
        pos = end;
    }
}

/// Parse the header from a byte prefix of the file.
///
/// `cap` bounds the scan; a header that has not terminated within the cap
/// fails with [`WaveError::HeaderTooLarge`] and the caller must re-invoke
/// with a larger cap.
pub fn parse_header(data: &[u8], cap: usize) -> Result<FileDescriptor> {
    let scan = &data[..data.len().min(cap)];

    let mut detected = None;
    for encoding in ENCODING_CANDIDATES {
        match scan_lines(scan, encoding) {
            ScanOutcome::Lines(lines, offset) => {
                detected = Some((encoding, lines, offset));
                break;
            }
            ScanOutcome::Truncated => return Err(WaveError::HeaderTooLarge(cap)),
            ScanOutcome::DecodeFailed => continue,
        }
    }
    let (encoding, raw_lines, data_offset) = detected.ok_or(WaveError::UnknownEncoding)?;

    let lines: Vec<&str> = raw_lines.iter().map(|l| l.trim_end()).collect();
    let terminator = *lines.last().unwrap_or(&"");

    let variables_at = lines
        .iter()
        .position(|&l| l == "Variables:")
        .ok_or_else(|| WaveError::MalformedHeader("missing Variables: line".into()))?;

    let mut title = String::new();
    let mut date = String::new();
    let mut plot_name = String::new();
    let mut flags: Vec<String> = Vec::new();
    let mut variable_count = 0usize;
    let mut point_count = 0usize;
    let mut offset = 0.0f64;

    for &line in &lines[..variables_at] {
        if let Some(value) = line.strip_prefix(HEADER_TAGS[0]) {
            title = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(HEADER_TAGS[1]) {
            date = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(HEADER_TAGS[2]) {
            plot_name = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(HEADER_TAGS[3]) {
            flags = value.split_whitespace().map(|s| s.to_string()).collect();
        } else if let Some(value) = line.strip_prefix(HEADER_TAGS[4]) {
            variable_count = parse_field(value, "No. Variables")?;
        } else if let Some(value) = line.strip_prefix(HEADER_TAGS[5]) {
            point_count = parse_field(value, "No. Points")?;
        } else if let Some(value) = line.strip_prefix(HEADER_TAGS[6]) {
            offset = parse_field(value, "Offset")?;
        }
        // Unknown tags are preserved in the file but not interpreted.
    }

    let mut variables = Vec::with_capacity(variable_count);
    for &row in &lines[variables_at + 1..lines.len().saturating_sub(1)] {
        let parts: Vec<&str> = row.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(WaveError::MalformedHeader(format!(
                "bad variable row {row:?}"
            )));
        }
        variables.push(VariableSpec {
            name: parts[1].to_string(),
            var_type: parts[2].to_string(),
        });
    }
    if variables.len() != variable_count {
        return Err(WaveError::MalformedHeader(format!(
            "declared {} variables, found {}",
            variable_count,
            variables.len()
        )));
    }

    let mode = MODE_MARKERS
        .iter()
        .find(|(marker, _)| plot_name.contains(marker))
        .map(|&(_, mode)| mode)
        .unwrap_or(SimulationMode::Transient);

    let mut x_type = SampleType::F64;
    let mut y_type;
    let container = if terminator.contains("Binary") {
        y_type = if flags.iter().any(|f| f == "double") {
            SampleType::F64
        } else {
            SampleType::F32
        };
        ContainerKind::Binary
    } else if terminator.contains("Value") {
        y_type = SampleType::F64;
        ContainerKind::Ascii
    } else {
        return Err(WaveError::UnrecognizedContainer(terminator.to_string()));
    };

    if mode.is_complex() {
        x_type = SampleType::Complex128;
        y_type = SampleType::Complex128;
    }

    debug!(
        ?encoding,
        ?container,
        ?mode,
        variables = variable_count,
        points = point_count,
        data_offset,
        "header parsed"
    );

    Ok(FileDescriptor {
        title,
        date,
        plot_name,
        flags,
        variable_count,
        point_count,
        offset,
        variables,
        container,
        encoding,
        x_type,
        y_type,
        mode,
        data_offset,
    })
}

fn parse_field<T: std::str::FromStr>(value: &str, tag: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| WaveError::MalformedHeader(format!("bad {tag} field {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_HEADER_SIZE;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn transient_header() -> String {
        "Title: * lowpass filter\n\
         Date: Sat Aug 23 10:00:00 2025\n\
         Plotname: Transient Analysis\n\
         Flags: real\n\
         No. Variables: 3\n\
         No. Points: 4\n\
         Variables:\n\
         \t0\ttime\ttime\n\
         \t1\tV(out)\tvoltage\n\
         \t2\tI(R1)\tdevice_current\n\
         Binary:\n"
            .to_string()
    }

    #[test]
    fn test_parse_utf8_header() {
        let bytes = transient_header().into_bytes();
        let desc = parse_header(&bytes, MAX_HEADER_SIZE).unwrap();

        assert_eq!(desc.encoding, TextEncoding::Utf8);
        assert_eq!(desc.container, ContainerKind::Binary);
        assert_eq!(desc.mode, SimulationMode::Transient);
        assert_eq!(desc.title, "* lowpass filter");
        assert_eq!(desc.plot_name, "Transient Analysis");
        assert_eq!(desc.variable_count, 3);
        assert_eq!(desc.point_count, 4);
        assert_eq!(desc.variables.len(), 3);
        assert_eq!(desc.variables[0].name, "time");
        assert_eq!(desc.variables[1].name, "V(out)");
        assert_eq!(desc.variables[2].var_type, "device_current");
        assert_eq!(desc.x_type, SampleType::F64);
        assert_eq!(desc.y_type, SampleType::F32);
        assert_eq!(desc.data_offset, bytes.len());
    }

    #[test]
    fn test_parse_utf16_header() {
        let text = transient_header();
        let bytes = utf16le(&text);
        let desc = parse_header(&bytes, MAX_HEADER_SIZE).unwrap();

        assert_eq!(desc.encoding, TextEncoding::Utf16Le);
        assert_eq!(desc.variable_count, 3);
        // Offset is in bytes, so twice the character count.
        assert_eq!(desc.data_offset, text.len() * 2);
    }

    #[test]
    fn test_double_flag_upgrades_dependent_width() {
        let text = transient_header().replace("Flags: real", "Flags: real double");
        let desc = parse_header(text.as_bytes(), MAX_HEADER_SIZE).unwrap();
        assert_eq!(desc.y_type, SampleType::F64);
    }

    #[test]
    fn test_ac_mode_forces_complex() {
        let text = transient_header()
            .replace("Plotname: Transient Analysis", "Plotname: AC Analysis")
            .replace("\t0\ttime\ttime", "\t0\tfrequency\tfrequency");
        let desc = parse_header(text.as_bytes(), MAX_HEADER_SIZE).unwrap();
        assert_eq!(desc.mode, SimulationMode::AC);
        assert_eq!(desc.x_type, SampleType::Complex128);
        assert_eq!(desc.y_type, SampleType::Complex128);
    }

    #[test]
    fn test_mode_priority_fft_before_transient() {
        // "FFT of Transient" must resolve as FFT, the higher-priority marker.
        let text = transient_header().replace(
            "Plotname: Transient Analysis",
            "Plotname: FFT of Transient Analysis",
        );
        let desc = parse_header(text.as_bytes(), MAX_HEADER_SIZE).unwrap();
        assert_eq!(desc.mode, SimulationMode::FFT);
    }

    #[test]
    fn test_ascii_container() {
        let text = transient_header().replace("Binary:", "Values:");
        let desc = parse_header(text.as_bytes(), MAX_HEADER_SIZE).unwrap();
        assert_eq!(desc.container, ContainerKind::Ascii);
        assert_eq!(desc.y_type, SampleType::F64);
    }

    #[test]
    fn test_unknown_encoding() {
        // First line is invalid under UTF-16LE (lone high surrogate) and
        // invalid under UTF-8 (stray 0xD8 continuation), so neither candidate
        // may silently win.
        let bytes = [0x00, 0xD8, 0x0A, 0x00, 0xFF, 0x0A];
        match parse_header(&bytes, MAX_HEADER_SIZE) {
            Err(WaveError::UnknownEncoding) => {}
            other => panic!("expected UnknownEncoding, got {other:?}"),
        }
    }

    #[test]
    fn test_header_too_large() {
        let bytes = transient_header().into_bytes();
        match parse_header(&bytes, 16) {
            Err(WaveError::HeaderTooLarge(16)) => {}
            other => panic!("expected HeaderTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_variable_row() {
        let broken = transient_header().replace("\t1\tV(out)\tvoltage", "\t1");
        match parse_header(broken.as_bytes(), MAX_HEADER_SIZE) {
            Err(WaveError::MalformedHeader(_)) => {}
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_variable_count_mismatch() {
        let text = transient_header().replace("No. Variables: 3", "No. Variables: 4");
        match parse_header(text.as_bytes(), MAX_HEADER_SIZE) {
            Err(WaveError::MalformedHeader(_)) => {}
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }
}
