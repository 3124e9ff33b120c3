//! Plain data rows written by output backends.

use tc_loop::TrafficSample;

/// One metrics sample as persisted by the writers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficSampleRow {
    pub step:              u64,
    pub average_speed_m_s: f64,
    pub co2_mg_s:          f64,
}

impl From<&TrafficSample> for TrafficSampleRow {
    fn from(sample: &TrafficSample) -> Self {
        Self {
            step:              sample.step.0,
            average_speed_m_s: sample.average_speed,
            co2_mg_s:          sample.co2_mg_s,
        }
    }
}
