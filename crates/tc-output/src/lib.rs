//! `tc-output` — persistence for the loop's metric samples.
//!
//! The control loop emits a [`TrafficSample`][tc_loop::TrafficSample] every
//! `sample_interval` steps; this crate writes them to disk.  The CSV backend
//! flushes after every row, so a crash between samples loses at most the
//! unsampled tail.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tc_output::{CsvSampleWriter, SampleObserver};
//!
//! let writer = CsvSampleWriter::new(Path::new("./output"))?;
//! let mut obs = SampleObserver::new(writer);
//! ctl.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvSampleWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SampleObserver;
pub use row::TrafficSampleRow;
pub use writer::SampleWriter;
