// ISFReader Module
// Decodes Tektronix TDS-series ISF waveform files

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{IsfError, Result};
use crate::header::{sanitize_header, ByteOrder, HeaderFields, HEADER_LEN};

/// Voltage data for one of the two acquisition modes.
#[derive(Clone, Debug, PartialEq)]
pub enum Waveform {
    Normal { voltage: Vec<f64> },
    /// Min/max pairs per time step, stored max first.
    Envelope { vmax: Vec<f64>, vmin: Vec<f64> },
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Normal { voltage: Vec::new() }
    }
}

/// Time axis plus voltages in engineering units.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct WaveformSeries {
    pub time: Vec<f64>,
    pub waveform: Waveform,
}

impl WaveformSeries {
    /// Convert raw samples using the header's scale and time base.
    pub fn from_samples(header: &HeaderFields, samples: &[i16]) -> Self {
        let scale = |raw: i16| header.y_zero + header.y_multiplier * (f64::from(raw) - header.y_offset);

        if header.is_envelope() {
            let points = samples.len() / 2;
            let pairs = samples.chunks_exact(2);
            WaveformSeries {
                time: time_axis(header.x_zero, header.x_increment, 2.0, points),
                waveform: Waveform::Envelope {
                    vmax: pairs.clone().map(|p| scale(p[1])).collect(),
                    vmin: pairs.map(|p| scale(p[0])).collect(),
                },
            }
        } else {
            WaveformSeries {
                time: time_axis(header.x_zero, header.x_increment, 1.0, samples.len()),
                waveform: Waveform::Normal {
                    voltage: samples.iter().map(|&s| scale(s)).collect(),
                },
            }
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

// x_zero + x_increment * i * stride, shifted so the earliest time is zero.
fn time_axis(x_zero: f64, x_increment: f64, stride: f64, count: usize) -> Vec<f64> {
    let mut time: Vec<f64> = (0..count)
        .map(|i| x_zero + x_increment * i as f64 * stride)
        .collect();

    let min = time.iter().copied().fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        for t in &mut time {
            *t -= min;
        }
    }
    time
}

fn eof_as_block_error(e: io::Error, what: &str) -> IsfError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            IsfError::InvalidBlockHeader(format!("file ends inside {}", what))
        }
        _ => IsfError::Io(e),
    }
}

/// Read the curve block that starts at the `#` found at `marker`.
///
/// Layout is `#<n><n length digits><data>`. The length digits are skipped;
/// the number of samples read comes from the header's point count.
fn read_samples<R: Read + Seek>(
    reader: &mut R,
    marker: usize,
    point_count: usize,
    byte_order: ByteOrder,
) -> Result<Vec<i16>> {
    reader.seek(SeekFrom::Start(marker as u64 + 1))?;

    let mut digit = [0u8; 1];
    reader
        .read_exact(&mut digit)
        .map_err(|e| eof_as_block_error(e, "block digit count"))?;
    let num_digits = (digit[0] as char).to_digit(10).ok_or_else(|| {
        IsfError::InvalidBlockHeader(format!(
            "expected digit count after '#', found {:?}",
            digit[0] as char
        ))
    })? as usize;

    let mut length_field = vec![0u8; num_digits];
    reader
        .read_exact(&mut length_field)
        .map_err(|e| eof_as_block_error(e, "block length field"))?;

    let expected_bytes = point_count.saturating_mul(2);
    let declared = std::str::from_utf8(&length_field)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok());
    match declared {
        Some(len) if len != expected_bytes => warn!(
            declared = len,
            expected = expected_bytes,
            "block length disagrees with point count, using point count"
        ),
        None if num_digits > 0 => warn!("block length field is not a number, ignoring it"),
        _ => {}
    }

    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(expected_bytes as u64)
        .read_to_end(&mut payload)?;

    if payload.len() < expected_bytes {
        return Err(IsfError::TruncatedPayload {
            expected: point_count,
            available: payload.len() / 2,
        });
    }

    Ok(payload
        .chunks_exact(2)
        .map(|pair| byte_order.decode([pair[0], pair[1]]))
        .collect())
}

/// Options for delimited text export.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub delimiter: char,
    /// Emit header fields as `#` comment lines before the data.
    pub metadata: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            delimiter: ',',
            metadata: true,
        }
    }
}

/// Main ISF file reader
#[derive(Default, Debug)]
pub struct IsfFile {
    pub file_path: String,
    pub header: HeaderFields,
    pub series: WaveformSeries,
}

impl IsfFile {
    /// Create a new, empty IsfFile instance
    pub fn new() -> Self {
        IsfFile::default()
    }

    /// Open and decode an ISF file in one step.
    pub fn open<P: AsRef<Path>>(input_file: P) -> Result<Self> {
        let mut isf = IsfFile::new();
        isf.load_file(input_file)?;
        Ok(isf)
    }

    /// Load an ISF file from the given path
    ///
    /// On error `self` is left unchanged.
    pub fn load_file<P: AsRef<Path>>(&mut self, input_file: P) -> Result<()> {
        let path = input_file.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => IsfError::FileNotFound(path.display().to_string()),
            _ => IsfError::Io(e),
        })?;
        let mut reader = BufReader::new(file);

        // Read and parse header
        let mut header_buf = Vec::with_capacity(HEADER_LEN);
        reader
            .by_ref()
            .take(HEADER_LEN as u64)
            .read_to_end(&mut header_buf)?;
        let header_text = sanitize_header(&header_buf);

        let header = HeaderFields::parse(&header_text)?;
        let byte_order = header.validate()?;

        // Read curve data
        let marker = header_text.find('#').ok_or(IsfError::MissingBlockMarker)?;
        debug!(
            marker,
            points = header.point_count,
            ?byte_order,
            envelope = header.is_envelope(),
            "reading curve block"
        );
        let samples = read_samples(&mut reader, marker, header.point_count, byte_order)?;

        self.series = WaveformSeries::from_samples(&header, &samples);
        self.header = header;
        self.file_path = path.to_string_lossy().to_string();
        debug!(points = self.series.len(), "decoded {}", self.file_path);

        Ok(())
    }

    /// Number of decoded time points (halved for envelope files).
    pub fn point_count(&self) -> usize {
        self.series.len()
    }

    pub fn is_envelope(&self) -> bool {
        matches!(self.series.waveform, Waveform::Envelope { .. })
    }

    /// Get time values for decoded points
    pub fn time_values(&self) -> &[f64] {
        &self.series.time
    }

    /// Short human-readable description of the decoded file.
    pub fn summary(&self) -> String {
        format!(
            "     Information : {}\n     Pointformat : {}\n     Time Points : {}\n Horizontal Unit : [{}]\n Vertical   Unit : [{}]\n",
            self.header.waveform_id,
            self.header.point_format,
            self.point_count(),
            self.header.x_unit,
            self.header.y_unit
        )
    }

    /// Write the series as delimited text, one row per time point.
    ///
    /// Normal rows are `time,voltage`; envelope rows are `time,vmax,vmin`.
    pub fn write_delimited<W: Write>(&self, mut writer: W, options: &ExportOptions) -> Result<()> {
        let d = options.delimiter;

        if options.metadata {
            writeln!(writer, "# {}", self.header.waveform_id)?;
            for (key, value) in self.header.entries() {
                writeln!(writer, "# {}: {}", key, value)?;
            }
            match self.series.waveform {
                Waveform::Normal { .. } => writeln!(writer, "# Time{}Value", d)?,
                Waveform::Envelope { .. } => writeln!(writer, "# Time{}MaxValue{}MinValue", d, d)?,
            }
        }

        match &self.series.waveform {
            Waveform::Normal { voltage } => {
                for (t, v) in self.series.time.iter().zip(voltage) {
                    writeln!(writer, "{}{}{}", t, d, v)?;
                }
            }
            Waveform::Envelope { vmax, vmin } => {
                for ((t, hi), lo) in self.series.time.iter().zip(vmax).zip(vmin) {
                    writeln!(writer, "{}{}{}{}{}", t, d, hi, d, lo)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the series to a delimited text file
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P, options: &ExportOptions) -> Result<()> {
        let file = File::create(output_file)?;
        self.write_delimited(BufWriter::new(file), options)
    }
}
