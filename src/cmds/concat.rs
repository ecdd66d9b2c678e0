use super::utils::{ensure_source_dir, file_name, list_videos};
use crate::{
    clip::{build_chapters, sort_clips, Chapter, Clip},
    ffmpeg::{concat::concat_with_chapters, probe, Tools},
};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Parser)]
pub struct ConcatArgs {
    /// Directory holding recorder clips
    pub dir: PathBuf,
    /// Defaults to `<dir>/<name> <date>.mp4` after the first clip
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long, default_value = "mp4")]
    pub extension: String,
}

#[derive(Debug)]
pub struct Splice {
    /// Canonical form of the clip directory.
    pub dir: PathBuf,
    pub clips: Vec<Clip>,
    pub chapters: Vec<Chapter>,
}

/// Finds the recorder clips in `dir` and lays out one chapter per clip.
pub fn plan_splice(tools: &Tools, dir: &Path, extension: &str) -> Result<Splice> {
    ensure_source_dir(dir)?;
    let dir = dir
        .canonicalize()
        .with_context(|| format!("resolving {}", dir.display()))?;

    let mut clips = vec![];
    for path in list_videos(&dir, extension)? {
        match Clip::parse(&path) {
            Some(clip) => clips.push(clip),
            None => log::warn!("{}: not a recorder clip, skipped", file_name(&path)),
        }
    }
    if clips.is_empty() {
        bail!("no recorder clips found in {}", dir.display());
    }
    sort_clips(&mut clips);

    let mut timed = vec![];
    for clip in clips {
        let length = probe::duration(tools, &clip.path)
            .with_context(|| format!("probing {}", clip.path.display()))?;
        log::info!("{}: {:.3}s", file_name(&clip.path), length.as_secs_f64());
        timed.push((clip, length));
    }
    let chapters = build_chapters(&timed);
    Ok(Splice {
        dir,
        clips: timed.into_iter().map(|(clip, _)| clip).collect(),
        chapters,
    })
}

fn default_output(dir: &Path, first: &Clip) -> PathBuf {
    dir.join(format!("{} {}.mp4", first.name, first.date()))
}

/// Resolves the parent directory of `out` so it compares equal to the
/// canonical clip paths. The file itself may not exist yet.
fn resolve_output(out: &Path) -> Result<PathBuf> {
    let Some(name) = out.file_name() else {
        bail!("output {} does not name a file", out.display());
    };
    let parent = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = parent
        .canonicalize()
        .with_context(|| format!("resolving {}", parent.display()))?;
    Ok(parent.join(name))
}

pub fn concat_clips(tools: &Tools, args: &ConcatArgs) -> Result<PathBuf> {
    let splice = plan_splice(tools, &args.dir, &args.extension)?;
    let out = match &args.out {
        Some(out) => resolve_output(out)?,
        None => default_output(&splice.dir, &splice.clips[0]),
    };
    if splice.clips.iter().any(|c| c.path == out) {
        bail!("output {} would overwrite one of the clips", out.display());
    }

    let files = splice
        .clips
        .iter()
        .map(|c| c.path.as_path())
        .collect::<Vec<_>>();
    concat_with_chapters(tools, &files, &splice.chapters, &out)?;
    println!(
        "O: {} ({} chapters)",
        out.display(),
        splice.chapters.len()
    );
    Ok(out)
}
