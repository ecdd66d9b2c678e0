use super::{os, write_atomically, Tools};
use crate::error::TranscodeError;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Encoder parameters shared by every job of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeSettings {
    pub video_codec: String,
    pub preset: String,
    pub frame_rate: u32,
    pub audio_sample_rate: u32,
    pub audio_bitrate_kbps: u32,
    pub container: String,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "hevc_nvenc".to_string(),
            preset: "fast".to_string(),
            frame_rate: 60,
            audio_sample_rate: 48_000,
            audio_bitrate_kbps: 192,
            container: "mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Mbit/s
    pub bitrate: f64,
}

impl TranscodeSettings {
    pub fn args(&self, input: &Path, bitrate: f64, output: &Path) -> Vec<OsString> {
        vec![
            os("-i"),
            os(input),
            os("-c:v"),
            os(&self.video_codec),
            os("-preset"),
            os(&self.preset),
            os("-b:v"),
            os(format!("{}M", bitrate)),
            os("-r"),
            os(self.frame_rate.to_string()),
            os("-ar"),
            os(self.audio_sample_rate.to_string()),
            os("-b:a"),
            os(format!("{}k", self.audio_bitrate_kbps)),
            // output goes to a partial path, so the muxer can't be guessed from it
            os("-f"),
            os(&self.container),
            os(output),
        ]
    }
}

pub fn transcode(
    tools: &Tools,
    settings: &TranscodeSettings,
    job: &TranscodeJob,
) -> Result<(), TranscodeError> {
    write_atomically(&job.output, |partial| {
        tools.ffmpeg(settings.args(&job.input, job.bitrate, partial))
    })
}
