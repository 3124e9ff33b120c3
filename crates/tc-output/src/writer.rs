//! The `SampleWriter` trait implemented by backend writers.

use crate::{OutputResult, TrafficSampleRow};

/// A sink for metric samples.
///
/// All methods are infallible from the observer's perspective — errors are
/// stored by [`SampleObserver`][crate::SampleObserver] and retrieved with
/// `take_error` after the run.
pub trait SampleWriter {
    /// Persist one sample row.
    fn write_sample(&mut self, row: &TrafficSampleRow) -> OutputResult<()>;

    /// Flush and close the underlying sink.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
