// src/header.rs
// ISF header text: field extraction, naming schemes and format checks

use std::str::FromStr;
use tracing::debug;

use crate::error::{IsfError, Result};

/// Number of leading file bytes treated as header text.
pub const HEADER_LEN: usize = 511;

/// Clamp raw header bytes into printable ASCII and read them as text.
///
/// Only the first [`HEADER_LEN`] bytes are used. Bytes below 9 become a tab,
/// bytes above 126 become `~`, so binary sample data sharing the region
/// cannot break string handling.
pub fn sanitize_header(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(HEADER_LEN)
        .map(|&b| b.clamp(9, 126) as char)
        .collect()
}

// Text after the first `tag`, shifted by `skip` bytes, up to the next ';'.
fn value_after<'a>(text: &'a str, tag: &str, skip: usize) -> Option<&'a str> {
    let start = text.find(tag)? + tag.len() + skip;
    let rest = text.get(start..)?;
    let end = rest.find(';').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Numeric value following `tag`, e.g. `NR_PT 10000;`.
pub fn extract_number<T: FromStr>(text: &str, tag: &str) -> Option<T> {
    value_after(text, tag, 0)?.trim().parse().ok()
}

/// Bare token following `tag` and one separator byte, e.g. `ENCDG BIN;`.
pub fn extract_token(text: &str, tag: &str) -> Option<String> {
    value_after(text, tag, 1).map(|s| s.trim().to_string())
}

/// Quoted value following `tag`, e.g. `XUNIT "s";`.
///
/// The run up to the first quote is scanned and dropped, and the value is the
/// run between the first and second quote. Both quotes must be present.
pub fn extract_quoted(text: &str, tag: &str) -> Option<String> {
    let start = text.find(tag)? + tag.len();
    let mut runs = text.get(start..)?.splitn(3, '"');
    let _leading = runs.next()?;
    let value = runs.next()?;
    runs.next()?;
    Some(value.to_string())
}

/// Field naming convention used by the instrument firmware.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScheme {
    /// Long names written by older TDS firmware (`BYT_NR`, `NR_PT`, ...).
    #[default]
    Verbose,
    /// Short names written by newer firmware (`BYT_N`, `NR_P`, ...).
    Truncated,
}

/// Tag for every header field under one naming scheme.
#[derive(Debug)]
pub struct FieldNames {
    pub byte_width: &'static str,
    pub bit_width: &'static str,
    pub encoding: &'static str,
    pub binary_format: &'static str,
    pub byte_order: &'static str,
    pub waveform_id: &'static str,
    pub point_format: &'static str,
    pub x_unit: &'static str,
    pub y_unit: &'static str,
    pub x_zero: &'static str,
    pub x_increment: &'static str,
    pub point_offset: &'static str,
    pub y_multiplier: &'static str,
    pub y_zero: &'static str,
    pub y_offset: &'static str,
    pub point_count: &'static str,
}

static VERBOSE_NAMES: FieldNames = FieldNames {
    byte_width: "BYT_NR",
    bit_width: "BIT_NR",
    encoding: "ENCDG",
    binary_format: "BN_FMT",
    byte_order: "BYT_OR",
    waveform_id: "WFID",
    point_format: "PT_FMT",
    x_unit: "XUNIT",
    y_unit: "YUNIT",
    x_zero: "XZERO",
    x_increment: "XINCR",
    point_offset: "PT_OFF",
    y_multiplier: "YMULT",
    y_zero: "YZERO",
    y_offset: "YOFF",
    point_count: "NR_PT",
};

static TRUNCATED_NAMES: FieldNames = FieldNames {
    byte_width: "BYT_N",
    bit_width: "BIT_N",
    encoding: "ENC",
    binary_format: "BN_F",
    byte_order: "BYT_O",
    waveform_id: "WFI",
    point_format: "PT_F",
    x_unit: "XUN",
    y_unit: "YUN",
    x_zero: "XZE",
    x_increment: "XIN",
    point_offset: "PT_O",
    y_multiplier: "YMU",
    y_zero: "YZE",
    y_offset: "YOF",
    point_count: "NR_P",
};

impl HeaderScheme {
    pub fn names(self) -> &'static FieldNames {
        match self {
            HeaderScheme::Verbose => &VERBOSE_NAMES,
            HeaderScheme::Truncated => &TRUNCATED_NAMES,
        }
    }

    /// Pick the scheme for a header: verbose when its point count is present.
    pub fn detect(text: &str) -> Self {
        if extract_number::<usize>(text, VERBOSE_NAMES.point_count).is_some() {
            HeaderScheme::Verbose
        } else {
            HeaderScheme::Truncated
        }
    }
}

/// Sample byte order declared by `BYT_OR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Msb,
    Lsb,
}

impl ByteOrder {
    pub fn decode(self, bytes: [u8; 2]) -> i16 {
        match self {
            ByteOrder::Msb => i16::from_be_bytes(bytes),
            ByteOrder::Lsb => i16::from_le_bytes(bytes),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = IsfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MSB" => Ok(ByteOrder::Msb),
            "LSB" => Ok(ByteOrder::Lsb),
            other => Err(IsfError::UnrecognizedByteOrder(other.to_string())),
        }
    }
}

/// Header record decoded from the ISF text segment.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct HeaderFields {
    pub scheme: HeaderScheme,
    pub byte_width: Option<u32>,
    pub bit_width: Option<u32>,
    pub encoding: String,
    pub binary_format: String,
    pub byte_order: String,
    pub waveform_id: String,
    pub point_format: String,
    pub x_unit: String,
    pub y_unit: String,
    pub x_zero: f64,
    pub x_increment: f64,
    pub point_offset: Option<f64>,
    pub y_multiplier: f64,
    pub y_zero: f64,
    pub y_offset: f64,
    pub point_count: usize,
}

impl HeaderFields {
    /// Parse sanitized header text, selecting the naming scheme first.
    pub fn parse(text: &str) -> Result<Self> {
        let scheme = HeaderScheme::detect(text);
        debug!(?scheme, "selected header naming scheme");
        Self::parse_with(text, scheme)
    }

    /// Parse every field using the tags of one scheme.
    pub fn parse_with(text: &str, scheme: HeaderScheme) -> Result<Self> {
        let names = scheme.names();
        let required = |tag: &'static str| -> Result<f64> {
            extract_number(text, tag).ok_or(IsfError::MissingField(tag))
        };
        let token = |tag: &str| extract_token(text, tag).unwrap_or_default();
        let quoted = |tag: &str| extract_quoted(text, tag).unwrap_or_default();

        let point_count = extract_number(text, names.point_count)
            .ok_or(IsfError::MissingField(names.point_count))?;

        Ok(HeaderFields {
            scheme,
            byte_width: extract_number(text, names.byte_width),
            bit_width: extract_number(text, names.bit_width),
            encoding: token(names.encoding),
            binary_format: token(names.binary_format),
            byte_order: token(names.byte_order),
            waveform_id: quoted(names.waveform_id),
            point_format: token(names.point_format),
            x_unit: quoted(names.x_unit),
            y_unit: quoted(names.y_unit),
            x_zero: required(names.x_zero)?,
            x_increment: required(names.x_increment)?,
            point_offset: extract_number(text, names.point_offset),
            y_multiplier: required(names.y_multiplier)?,
            y_zero: required(names.y_zero)?,
            y_offset: required(names.y_offset)?,
            point_count,
        })
    }

    /// Check the sample encoding is 16-bit signed binary and resolve the byte order.
    ///
    /// The point format is deliberately not checked: envelope files pass.
    pub fn validate(&self) -> Result<ByteOrder> {
        if self.byte_width != Some(2)
            || self.bit_width != Some(16)
            || self.encoding != "BIN"
            || self.binary_format != "RI"
        {
            return Err(IsfError::UnsupportedFormat);
        }
        self.byte_order.parse()
    }

    pub fn is_envelope(&self) -> bool {
        self.point_format == "ENV"
    }

    /// Field values keyed by the tags of the scheme they were read with.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let names = self.scheme.names();
        let opt = |v: Option<String>| v.unwrap_or_default();
        vec![
            (names.byte_width, opt(self.byte_width.map(|v| v.to_string()))),
            (names.bit_width, opt(self.bit_width.map(|v| v.to_string()))),
            (names.encoding, self.encoding.clone()),
            (names.binary_format, self.binary_format.clone()),
            (names.byte_order, self.byte_order.clone()),
            (names.waveform_id, self.waveform_id.clone()),
            (names.point_format, self.point_format.clone()),
            (names.x_unit, self.x_unit.clone()),
            (names.y_unit, self.y_unit.clone()),
            (names.x_zero, self.x_zero.to_string()),
            (names.x_increment, self.x_increment.to_string()),
            (names.point_offset, opt(self.point_offset.map(|v| v.to_string()))),
            (names.y_multiplier, self.y_multiplier.to_string()),
            (names.y_zero, self.y_zero.to_string()),
            (names.y_offset, self.y_offset.to_string()),
            (names.point_count, self.point_count.to_string()),
        ]
    }
}
