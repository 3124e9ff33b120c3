//! `SampleObserver<W>` — bridges `ControlObserver` to a `SampleWriter`.

use tc_loop::{ControlObserver, RunOutcome, TrafficSample};

use crate::writer::SampleWriter;
use crate::{OutputError, TrafficSampleRow};

/// A [`ControlObserver`] that persists every sample through any
/// [`SampleWriter`] backend.
///
/// Writer errors are stored internally because observer callbacks have no
/// return value.  After the run, check for them with
/// [`take_error`][Self::take_error].
pub struct SampleObserver<W: SampleWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: SampleWriter> SampleObserver<W> {
    /// Create an observer backed by `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after the run.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: SampleWriter> ControlObserver for SampleObserver<W> {
    fn on_sample(&mut self, sample: &TrafficSample) {
        let row = TrafficSampleRow::from(sample);
        let result = self.writer.write_sample(&row);
        self.store_err(result);
    }

    fn on_run_end(&mut self, _outcome: &RunOutcome) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
