use crate::{
    error::ProbeError,
    ffmpeg::{probe, Tools},
};
use std::path::Path;

/// Files within this many Mbit/s of the target are left alone.
const TOLERANCE_MBPS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Transcode { bitrate: u64 },
    Skip { bitrate: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct BitrateFilter {
    threshold: u64,
}

impl BitrateFilter {
    pub fn new(target_mbps: f64) -> Self {
        let threshold = ((target_mbps + TOLERANCE_MBPS) * 1_000_000.0).round() as u64;
        Self { threshold }
    }

    /// bits/second
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn decide(&self, bitrate: u64) -> Decision {
        if bitrate > self.threshold {
            Decision::Transcode { bitrate }
        } else {
            Decision::Skip { bitrate }
        }
    }

    pub fn check(&self, tools: &Tools, path: &Path) -> Result<Decision, ProbeError> {
        let bitrate = probe::video_bitrate(tools, path)?;
        Ok(self.decide(bitrate))
    }
}
