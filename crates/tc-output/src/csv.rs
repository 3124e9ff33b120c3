//! CSV output backend.
//!
//! Creates `traffic_samples.csv` in the configured output directory.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::SampleWriter;
use crate::{OutputResult, TrafficSampleRow};

/// Writes metric samples to `traffic_samples.csv`.
///
/// Every row is flushed as soon as it is written: the sampling interval is
/// also the durability interval, and a crash mid-run keeps everything
/// sampled so far.
pub struct CsvSampleWriter {
    samples:  Writer<File>,
    finished: bool,
}

impl CsvSampleWriter {
    /// Open (or create) the CSV file in `dir` and write the header row.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut samples = Writer::from_path(dir.join("traffic_samples.csv"))?;
        samples.write_record(["step", "avg_speed_m_s", "co2_mg_s"])?;
        samples.flush()?;

        Ok(Self { samples, finished: false })
    }
}

impl SampleWriter for CsvSampleWriter {
    fn write_sample(&mut self, row: &TrafficSampleRow) -> OutputResult<()> {
        self.samples.write_record(&[
            row.step.to_string(),
            row.average_speed_m_s.to_string(),
            row.co2_mg_s.to_string(),
        ])?;
        self.samples.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.samples.flush()?;
        Ok(())
    }
}
