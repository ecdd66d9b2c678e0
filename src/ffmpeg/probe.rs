use super::{os, Tools};
use crate::error::ProbeError;
use serde::Deserialize;
use std::{path::Path, time::Duration};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<StreamEntry>,
    format: Option<FormatEntry>,
}

// ffprobe's json writer emits numbers as strings
#[derive(Debug, Deserialize)]
struct StreamEntry {
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormatEntry {
    duration: Option<String>,
}

/// Bitrate in bits/second of the first video stream.
pub fn video_bitrate(tools: &Tools, path: &Path) -> Result<u64, ProbeError> {
    let output = tools.ffprobe(vec![
        os("-select_streams"),
        os("v:0"),
        os("-show_entries"),
        os("stream=bit_rate"),
        os("-of"),
        os("json"),
        os(path),
    ])?;
    parse_bitrate(&output.stdout)
}

pub fn duration(tools: &Tools, path: &Path) -> Result<Duration, ProbeError> {
    let output = tools.ffprobe(vec![
        os("-show_entries"),
        os("format=duration"),
        os("-of"),
        os("json"),
        os(path),
    ])?;
    parse_duration(&output.stdout)
}

fn parse_bitrate(stdout: &[u8]) -> Result<u64, ProbeError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or(ProbeError::NoVideoStream)?;
    let raw = stream.bit_rate.unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProbeError::MissingField("bit_rate"));
    }
    let bitrate = raw.parse::<u64>().map_err(|_| ProbeError::InvalidValue {
        field: "bit_rate",
        value: raw.to_string(),
    })?;
    if bitrate == 0 {
        return Err(ProbeError::ZeroBitrate);
    }
    Ok(bitrate)
}

fn parse_duration(stdout: &[u8]) -> Result<Duration, ProbeError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)?;
    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or(ProbeError::MissingField("duration"))?;
    let invalid = || ProbeError::InvalidValue {
        field: "duration",
        value: raw.clone(),
    };
    let secs = raw.trim().parse::<f64>().map_err(|_| invalid())?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs_f64(secs))
}
