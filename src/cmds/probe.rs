use super::{
    filter::{BitrateFilter, Decision},
    utils::{ensure_source_dir, file_name, list_videos},
};
use crate::{
    clip::Timestamp,
    ffmpeg::{probe, Tools},
};
use anyhow::Result;
use comfy_table::Table;
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Parser)]
pub struct ProbeArgs {
    pub dir: PathBuf,
    /// Mark which clips `compress` would transcode at this target (Mbit/s)
    #[arg(long)]
    pub bitrate: Option<f64>,
    #[arg(long, default_value = "mp4")]
    pub extension: String,
}

#[derive(Debug)]
pub struct ProbeRow {
    pub file: String,
    pub bitrate: String,
    pub duration: String,
    pub decision: Option<String>,
}

fn probe_row(tools: &Tools, path: &Path, filter: Option<&BitrateFilter>) -> ProbeRow {
    let bitrate = probe::video_bitrate(tools, path);
    let duration = probe::duration(tools, path)
        .map(|d| Timestamp::from_duration(d).to_string())
        .unwrap_or_else(|e| format!("error: {}", e));
    let decision = filter.map(|filter| match &bitrate {
        Ok(b) => match filter.decide(*b) {
            Decision::Transcode { .. } => "transcode".to_string(),
            Decision::Skip { .. } => "skip".to_string(),
        },
        Err(_) => "probe failed".to_string(),
    });
    ProbeRow {
        file: file_name(path),
        bitrate: bitrate
            .map(|b| format!("{:.2}", b as f64 / 1_000_000.0))
            .unwrap_or_else(|e| format!("error: {}", e)),
        duration,
        decision,
    }
}

pub fn probe_rows(tools: &Tools, args: &ProbeArgs) -> Result<Vec<ProbeRow>> {
    ensure_source_dir(&args.dir)?;
    let filter = args.bitrate.map(BitrateFilter::new);
    Ok(list_videos(&args.dir, &args.extension)?
        .iter()
        .map(|path| probe_row(tools, path, filter.as_ref()))
        .collect())
}

pub fn list_probes(tools: &Tools, args: &ProbeArgs) -> Result<()> {
    let rows = probe_rows(tools, args)?;
    let mut table = Table::new();
    let mut header = vec!["file", "Mbit/s", "duration"];
    if args.bitrate.is_some() {
        header.push("compress");
    }
    table.set_header(header);
    for row in rows {
        let mut cells = vec![row.file, row.bitrate, row.duration];
        cells.extend(row.decision);
        table.add_row(cells);
    }
    println!("{}", table);
    Ok(())
}
