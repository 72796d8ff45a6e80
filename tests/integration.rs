// tests/integration.rs
// Integration tests for ISF Reader

use std::fs;
use std::io::Write;
use isf_reader::{ExportOptions, HeaderScheme, IsfError, IsfFile, Waveform};
use tempfile::NamedTempFile;

struct Params<'a> {
    byte_width: &'a str,
    byte_order: &'a str,
    point_format: &'a str,
    npts: usize,
    x_zero: &'a str,
    x_incr: &'a str,
    y_mult: &'a str,
    y_zero: &'a str,
    y_off: &'a str,
}

impl Default for Params<'_> {
    fn default() -> Self {
        Params {
            byte_width: "2",
            byte_order: "LSB",
            point_format: "Y",
            npts: 4,
            x_zero: "0",
            x_incr: "1",
            y_mult: "1",
            y_zero: "0",
            y_off: "0",
        }
    }
}

fn verbose_header(p: &Params) -> String {
    format!(
        ":WFMPRE:BYT_NR {};BIT_NR 16;ENCDG BIN;BN_FMT RI;BYT_OR {};\
         WFID \"Ch1, DC coupling, 1.0E0 V/div, 1.0E-3 s/div, {} points, Sample mode\";\
         NR_PT {};PT_FMT {};XUNIT \"s\";XINCR {};XZERO {};PT_OFF 0;\
         YUNIT \"V\";YMULT {};YOFF {};YZERO {};:CURVE ",
        p.byte_width, p.byte_order, p.npts, p.npts, p.point_format, p.x_incr, p.x_zero,
        p.y_mult, p.y_off, p.y_zero
    )
}

fn truncated_header(p: &Params) -> String {
    format!(
        ":WFMP:BYT_N {};BIT_N 16;ENC BIN;BN_F RI;BYT_O {};\
         WFI \"Ch1, DC coupling, 1.0E0 V/div, 1.0E-3 s/div, {} points, Sample mode\";\
         NR_P {};PT_F {};XUN \"s\";XIN {};XZE {};PT_O 0;\
         YUN \"V\";YMU {};YOF {};YZE {};:CURV ",
        p.byte_width, p.byte_order, p.npts, p.npts, p.point_format, p.x_incr, p.x_zero,
        p.y_mult, p.y_off, p.y_zero
    )
}

/// Helper to create a test ISF file: header text, `#<n><len>`, then samples
fn create_test_isf_file(header: &str, samples: &[i16], big_endian: bool) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");

    let length = (samples.len() * 2).to_string();
    let mut data = header.as_bytes().to_vec();
    data.push(b'#');
    data.extend_from_slice(length.len().to_string().as_bytes());
    data.extend_from_slice(length.as_bytes());
    for &s in samples {
        if big_endian {
            data.extend_from_slice(&s.to_be_bytes());
        } else {
            data.extend_from_slice(&s.to_le_bytes());
        }
    }
    data.extend_from_slice(b"\n");

    file.write_all(&data).expect("Failed to write test file");
    file.flush().expect("Failed to flush test file");
    file
}

fn voltages(isf: &IsfFile) -> &[f64] {
    match &isf.series.waveform {
        Waveform::Normal { voltage } => voltage,
        Waveform::Envelope { .. } => panic!("expected a normal waveform"),
    }
}

#[test]
fn test_end_to_end_little_endian() {
    let header = verbose_header(&Params::default());
    let file = create_test_isf_file(&header, &[0, 100, 200, 150], false);

    let isf = IsfFile::open(file.path()).expect("Failed to load ISF file");

    assert_eq!(isf.header.scheme, HeaderScheme::Verbose);
    assert_eq!(isf.header.point_count, 4);
    assert_eq!(isf.header.x_unit, "s");
    assert_eq!(isf.header.y_unit, "V");
    assert!(isf.header.waveform_id.starts_with("Ch1, DC coupling"));
    assert_eq!(voltages(&isf), &[0.0, 100.0, 200.0, 150.0]);
    assert_eq!(isf.time_values(), &[0.0, 1.0, 2.0, 3.0]);
    assert_eq!(isf.file_path, file.path().to_string_lossy());
}

#[test]
fn test_big_endian_with_scaling() {
    let params = Params {
        byte_order: "MSB",
        npts: 5,
        x_zero: "-2.0E-3",
        x_incr: "4.0E-7",
        y_mult: "8.0E-5",
        y_zero: "1.0E-1",
        y_off: "1.28E2",
        ..Params::default()
    };
    let raw = [-32768i16, -1, 0, 128, 32767];
    let file = create_test_isf_file(&verbose_header(&params), &raw, true);

    let isf = IsfFile::open(file.path()).expect("Failed to load ISF file");
    let voltage = voltages(&isf);

    assert_eq!(voltage.len(), 5);
    assert_eq!(isf.time_values().len(), 5);
    for (v, &r) in voltage.iter().zip(raw.iter()) {
        let expected = 0.1 + 8.0e-5 * (r as f64 - 128.0);
        assert!((v - expected).abs() < 1e-12, "{} != {}", v, expected);
    }

    let times = isf.time_values();
    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    assert_eq!(min, 0.0);
    assert!((times[4] - 4.0 * 4.0e-7).abs() < 1e-15);
}

#[test]
fn test_envelope_mode() {
    let params = Params {
        point_format: "ENV",
        npts: 7,
        x_incr: "1.0E-6",
        ..Params::default()
    };
    let raw = [-5i16, 5, -6, 6, -7, 7, 99];
    let file = create_test_isf_file(&verbose_header(&params), &raw, false);

    let isf = IsfFile::open(file.path()).expect("Failed to load ISF file");
    assert!(isf.is_envelope());
    assert_eq!(isf.point_count(), 3);

    match &isf.series.waveform {
        Waveform::Envelope { vmax, vmin } => {
            assert_eq!(vmax, &vec![5.0, 6.0, 7.0]);
            assert_eq!(vmin, &vec![-5.0, -6.0, -7.0]);
        }
        Waveform::Normal { .. } => panic!("expected an envelope waveform"),
    }

    let times = isf.time_values();
    assert_eq!(times.len(), 3);
    assert_eq!(times[0], 0.0);
    assert!((times[1] - 2.0e-6).abs() < 1e-15);
    assert!((times[2] - 4.0e-6).abs() < 1e-15);
}

#[test]
fn test_truncated_scheme_decodes_like_verbose() {
    let params = Params {
        byte_order: "MSB",
        npts: 6,
        x_zero: "-5.0E-5",
        x_incr: "1.0E-8",
        y_mult: "1.5625E-5",
        ..Params::default()
    };
    let raw = [10i16, -20, 30, -40, 50, -60];

    let verbose_file = create_test_isf_file(&verbose_header(&params), &raw, true);
    let truncated_file = create_test_isf_file(&truncated_header(&params), &raw, true);

    let verbose = IsfFile::open(verbose_file.path()).expect("Failed to load verbose file");
    let truncated = IsfFile::open(truncated_file.path()).expect("Failed to load truncated file");

    assert_eq!(verbose.header.scheme, HeaderScheme::Verbose);
    assert_eq!(truncated.header.scheme, HeaderScheme::Truncated);
    assert_eq!(verbose.series, truncated.series);

    let mut header = truncated.header.clone();
    header.scheme = HeaderScheme::Verbose;
    assert_eq!(verbose.header, header);
}

#[test]
fn test_rejects_unsupported_byte_width() {
    let params = Params {
        byte_width: "1",
        ..Params::default()
    };
    let file = create_test_isf_file(&verbose_header(&params), &[1, 2, 3, 4], false);

    let result = IsfFile::open(file.path());
    match result {
        Err(e @ IsfError::UnsupportedFormat) => {
            assert_eq!(e.to_string(), "Unable to process ISF file")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_rejects_unknown_byte_order() {
    let params = Params {
        byte_order: "XYZ",
        ..Params::default()
    };
    let file = create_test_isf_file(&verbose_header(&params), &[1, 2, 3, 4], false);

    let result = IsfFile::open(file.path());
    assert!(matches!(result, Err(IsfError::UnrecognizedByteOrder(ref tag)) if tag == "XYZ"));
}

#[test]
fn test_truncated_payload() {
    let params = Params {
        npts: 10,
        ..Params::default()
    };
    let file = create_test_isf_file(&verbose_header(&params), &[1, 2, 3], false);

    let result = IsfFile::open(file.path());
    assert!(matches!(
        result,
        Err(IsfError::TruncatedPayload { expected: 10, .. })
    ));
}

#[test]
fn test_missing_point_count() {
    let header = verbose_header(&Params::default()).replace("NR_PT 4;", "");
    let file = create_test_isf_file(&header, &[1, 2, 3, 4], false);

    let result = IsfFile::open(file.path());
    assert!(matches!(result, Err(IsfError::MissingField(_))));
}

#[test]
fn test_missing_block_marker() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(verbose_header(&Params::default()).as_bytes()).unwrap();
    file.flush().unwrap();

    let result = IsfFile::open(file.path());
    assert!(matches!(result, Err(IsfError::MissingBlockMarker)));
}

#[test]
fn test_error_handling() {
    // Test non-existent file
    let result = IsfFile::open("non_existent.isf");
    assert!(matches!(result, Err(IsfError::FileNotFound(_))));

    // Test invalid ISF file
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"This is not an ISF file").unwrap();
    file.flush().unwrap();

    let mut isf = IsfFile::new();
    assert!(isf.load_file(file.path()).is_err());
    assert!(isf.file_path.is_empty());
    assert!(isf.series.is_empty());
}

#[test]
fn test_csv_export() {
    let header = verbose_header(&Params::default());
    let file = create_test_isf_file(&header, &[0, 100, 200, 150], false);
    let isf = IsfFile::open(file.path()).expect("Failed to load ISF file");

    let csv_file = NamedTempFile::new().unwrap();
    isf.write_csv(csv_file.path(), &ExportOptions::default())
        .expect("Failed to write CSV");

    let csv_content = fs::read_to_string(csv_file.path()).expect("Failed to read CSV");
    let data: Vec<&str> = csv_content.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(data, vec!["0,0", "1,100", "2,200", "3,150"]);
    assert!(csv_content.lines().any(|l| l == "# BYT_OR: LSB"));

    // Bare output with another delimiter
    let options = ExportOptions {
        delimiter: ' ',
        metadata: false,
    };
    isf.write_csv(csv_file.path(), &options).expect("Failed to write CSV");
    let bare = fs::read_to_string(csv_file.path()).expect("Failed to read CSV");
    assert_eq!(bare, "0 0\n1 100\n2 200\n3 150\n");
}
