use self::{
    compress::{compress, CompressArgs},
    concat::{concat_clips, ConcatArgs},
    probe::{list_probes, ProbeArgs},
};
use crate::ffmpeg::{CancelFlag, Tools};
use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, time::Duration};

pub mod compress;
pub mod concat;
pub mod filter;
pub mod probe;
pub mod utils;

/// Batch-compress and splice video clips with ffmpeg.
#[derive(Debug, clap::Parser)]
#[command(name = "clipkit", version)]
struct ClipkitCli {
    #[arg(long, env = "CLIPKIT_LOG", default_value = "info", global = true, value_parser = parse_level)]
    log_level: log::LevelFilter,
    #[arg(long, env = "FFMPEG", default_value = "ffmpeg", global = true)]
    ffmpeg: PathBuf,
    #[arg(long, env = "FFPROBE", default_value = "ffprobe", global = true)]
    ffprobe: PathBuf,
    /// Kill any single ffmpeg/ffprobe run after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: ClipkitCommand,
}

#[derive(Debug, clap::Subcommand)]
enum ClipkitCommand {
    /// Re-encode every clip above the target bitrate into a subdirectory
    Compress(CompressArgs),
    /// Join recorder clips into one file with a chapter per clip
    Concat(ConcatArgs),
    /// List clip bitrates and durations
    Probe(ProbeArgs),
}

fn parse_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("unknown log level {:?}", s))
}

/// Returns the process exit status.
pub fn handle_commands() -> Result<u8> {
    let args = ClipkitCli::parse();
    simplelog::SimpleLogger::init(args.log_level, Default::default())?;

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())?;

    let tools = Tools::new(&args.ffmpeg, &args.ffprobe)
        .with_timeout(args.timeout.map(Duration::from_secs))
        .with_cancel(cancel);

    match args.command {
        ClipkitCommand::Compress(args) => compress(&tools, &args),
        ClipkitCommand::Concat(args) => match concat_clips(&tools, &args) {
            Ok(_) => Ok(0),
            Err(e) if tools.cancel.is_cancelled() => {
                log::warn!("interrupted: {:#}", e);
                Ok(130)
            }
            Err(e) => Err(e),
        },
        ClipkitCommand::Probe(args) => list_probes(&tools, &args).map(|_| 0),
    }
}
