// src/lib.rs
// ISF Reader Library - Public API

//! # ISF Reader
//!
//! A Rust library for reading Tektronix ISF waveform files written by
//! TDS-series oscilloscopes.
//!
//! ## Features
//!
//! - Read 16-bit `RI`/`BIN` curves in either byte order
//! - Both header naming schemes (`NR_PT` style and the short `NR_P` style)
//! - Normal and envelope (`PT_FMT ENV`) acquisitions
//! - Export data to delimited text
//! - Proper error handling
//!
//! ## Example
//!
//! ```no_run
//! use isf_reader::{ExportOptions, IsfFile, Waveform};
//!
//! let isf = IsfFile::open("capture.isf").expect("Failed to load file");
//!
//! println!("Waveform: {}", isf.header.waveform_id);
//! println!("Points: {}", isf.point_count());
//!
//! if let Waveform::Normal { voltage } = &isf.series.waveform {
//!     println!("First sample: {} {}", voltage[0], isf.header.y_unit);
//! }
//!
//! // Export to CSV
//! isf.write_csv("output.csv", &ExportOptions::default())
//!     .expect("Failed to write CSV");
//! ```

mod error;
mod header;
mod isf_tools;

pub use error::{IsfError, Result};
pub use header::{
    extract_number, extract_quoted, extract_token, sanitize_header, ByteOrder, FieldNames,
    HeaderFields, HeaderScheme, HEADER_LEN,
};
pub use isf_tools::{ExportOptions, IsfFile, Waveform, WaveformSeries};
