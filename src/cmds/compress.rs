use super::{
    filter::{BitrateFilter, Decision},
    utils::{ensure_output_dir, ensure_source_dir, file_name, list_videos, output_dir_path},
};
use crate::{
    error::SetupError,
    ffmpeg::{
        transcode::{transcode, TranscodeJob, TranscodeSettings},
        Tools,
    },
};
use anyhow::Result;
use comfy_table::Table;
use kdam::BarExt;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Parser)]
pub struct CompressArgs {
    /// Directory holding the clips
    pub dir: PathBuf,
    /// Target video bitrate in Mbit/s
    pub bitrate: f64,
    /// Transcode every clip without probing its bitrate first
    #[arg(long)]
    pub all: bool,
    /// Probe and report without transcoding
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, default_value = "compressed")]
    pub output_dir_name: String,
    #[arg(long, default_value = "mp4")]
    pub extension: String,
    /// Write one CSV row per clip
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Transcoded { bitrate: Option<u64> },
    WouldTranscode { bitrate: Option<u64> },
    Skipped { bitrate: u64 },
    ProbeFailed(String),
    TranscodeFailed(String),
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Transcoded { .. } => "transcoded",
            Outcome::WouldTranscode { .. } => "would transcode",
            Outcome::Skipped { .. } => "skipped",
            Outcome::ProbeFailed(_) => "probe failed",
            Outcome::TranscodeFailed(_) => "transcode failed",
        }
    }

    fn bitrate(&self) -> Option<u64> {
        match self {
            Outcome::Transcoded { bitrate } | Outcome::WouldTranscode { bitrate } => *bitrate,
            Outcome::Skipped { bitrate } => Some(*bitrate),
            _ => None,
        }
    }

    fn detail(&self) -> &str {
        match self {
            Outcome::ProbeFailed(e) | Outcome::TranscodeFailed(e) => e,
            _ => "",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::ProbeFailed(_) | Outcome::TranscodeFailed(_))
    }
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    file: &'a str,
    outcome: &'a str,
    bitrate: Option<u64>,
    detail: &'a str,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<(String, Outcome)>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                Outcome::Transcoded { .. } | Outcome::WouldTranscode { .. }
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| f(o)).count()
    }

    /// 130 when interrupted, 2 when any clip failed, 0 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.cancelled {
            130
        } else if self.failed() > 0 {
            2
        } else {
            0
        }
    }

    pub fn print(&self) {
        let mut table = Table::new();
        table.set_header(vec!["file", "result", "Mbit/s", "detail"]);
        for (file, outcome) in self.entries.iter() {
            table.add_row(vec![
                file.to_string(),
                outcome.label().to_string(),
                outcome
                    .bitrate()
                    .map(|b| format!("{:.2}", b as f64 / 1_000_000.0))
                    .unwrap_or("---".to_string()),
                outcome.detail().lines().next().unwrap_or("").to_string(),
            ]);
        }
        println!("{}", table);
        println!(
            "processed={} skipped={} failed={}{}",
            self.processed(),
            self.skipped(),
            self.failed(),
            if self.cancelled { " (interrupted)" } else { "" }
        );
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (file, outcome) in self.entries.iter() {
            writer.serialize(ReportRow {
                file,
                outcome: outcome.label(),
                bitrate: outcome.bitrate(),
                detail: outcome.detail(),
            })?;
        }
        writer.flush()?;
        log::debug!("report written to {}", path.display());
        Ok(())
    }
}

pub struct BatchTranscoder<'a> {
    tools: &'a Tools,
    settings: TranscodeSettings,
    bitrate: f64,
    filter: Option<BitrateFilter>,
    dry_run: bool,
}

impl<'a> BatchTranscoder<'a> {
    pub fn new(tools: &'a Tools, bitrate: f64) -> Self {
        Self {
            tools,
            settings: TranscodeSettings::default(),
            bitrate,
            filter: Some(BitrateFilter::new(bitrate)),
            dry_run: false,
        }
    }

    pub fn without_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self, source: &Path, output_dir_name: &str, extension: &str) -> Result<BatchReport> {
        if !(self.bitrate.is_finite() && self.bitrate > 0.0) {
            return Err(SetupError::InvalidBitrate(self.bitrate).into());
        }
        ensure_source_dir(source)?;
        let out_dir = if self.dry_run {
            output_dir_path(source, output_dir_name)?
        } else {
            ensure_output_dir(source, output_dir_name)?
        };
        let files = list_videos(source, extension)?;
        log::info!(
            "{} clip(s) in {}, target {} Mbit/s",
            files.len(),
            source.display(),
            self.bitrate
        );
        if let Some(filter) = &self.filter {
            log::debug!("transcoding clips above {} bps", filter.threshold());
        }

        let mut report = BatchReport::default();
        let mut pb = kdam::tqdm!(total = files.len());
        for input in files.iter() {
            if self.tools.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let name = file_name(input);
            let outcome = self.process(input, &out_dir.join(&name));
            log_outcome(&name, &outcome);
            report.entries.push((name, outcome));
            pb.update(1)?;
            if self.tools.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
        }
        Ok(report)
    }

    fn process(&self, input: &Path, output: &Path) -> Outcome {
        let bitrate = match &self.filter {
            Some(filter) => match filter.check(self.tools, input) {
                Ok(Decision::Transcode { bitrate }) => Some(bitrate),
                Ok(Decision::Skip { bitrate }) => return Outcome::Skipped { bitrate },
                Err(e) => return Outcome::ProbeFailed(e.to_string()),
            },
            None => None,
        };
        if self.dry_run {
            return Outcome::WouldTranscode { bitrate };
        }

        let job = TranscodeJob {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bitrate: self.bitrate,
        };
        match transcode(self.tools, &self.settings, &job) {
            Ok(()) => Outcome::Transcoded { bitrate },
            Err(e) => Outcome::TranscodeFailed(e.to_string()),
        }
    }
}

fn log_outcome(name: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Transcoded { .. } => log::info!("{}: transcoded", name),
        Outcome::WouldTranscode { bitrate } => {
            log::info!("{}: would transcode (bitrate {:?} bps)", name, bitrate)
        }
        Outcome::Skipped { bitrate } => log::info!("{}: skipped, bitrate {} bps", name, bitrate),
        Outcome::ProbeFailed(e) => log::warn!("{}: probe failed: {}", name, e),
        Outcome::TranscodeFailed(e) => log::error!("{}: transcode failed: {}", name, e),
    }
}

pub fn compress(tools: &Tools, args: &CompressArgs) -> Result<u8> {
    let mut batch = BatchTranscoder::new(tools, args.bitrate).dry_run(args.dry_run);
    if args.all {
        batch = batch.without_filter();
    }
    let report = batch.run(&args.dir, &args.output_dir_name, &args.extension)?;
    report.print();
    if let Some(path) = &args.report {
        report.write_csv(path)?;
    }
    Ok(report.exit_status())
}
