use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Duration,
};

pub use self::timestamp::Timestamp;

mod timestamp;

const CLIP_PATTERN: &str = concat!(
    r"^(?P<name>.+) (?P<date>\d{4}\.\d{2}\.\d{2}) - ",
    r"(?P<time>\d{2}\.\d{2}\.\d{2})\.(?P<index>\d{3})\.DVR\.mp4",
    r"(?:-(?P<start>\d{2}\.\d{2}\.\d{2}\.\d{3})-(?P<end>\d{2}\.\d{2}\.\d{2}\.\d{3})\.mp4)?$",
);

fn clip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CLIP_PATTERN).expect("clip pattern is valid"))
}

/// Range trimmed out of a longer recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cut {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// A recorder clip, e.g. `Project Zomboid 2025.07.13 - 02.09.03.696.DVR.mp4`,
/// optionally trimmed: `...DVR.mp4-00.00.23.029-00.00.31.281.mp4`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub path: PathBuf,
    pub name: String,
    pub recorded_at: NaiveDateTime,
    pub cut: Option<Cut>,
}

impl Clip {
    /// `None` when the file name isn't a recorder clip.
    pub fn parse(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let caps = clip_regex().captures(file_name)?;

        let date = NaiveDate::parse_from_str(&caps["date"], "%Y.%m.%d").ok()?;
        let time = NaiveTime::parse_from_str(&caps["time"], "%H.%M.%S").ok()?;
        let index = caps["index"].parse::<i64>().ok()?;
        let recorded_at = date.and_time(time) + chrono::Duration::milliseconds(index);

        let cut = match (caps.name("start"), caps.name("end")) {
            (Some(start), Some(end)) => Some(Cut {
                start: start.as_str().parse().ok()?,
                end: end.as_str().parse().ok()?,
            }),
            _ => None,
        };

        Some(Self {
            path: path.to_path_buf(),
            name: caps["name"].to_string(),
            recorded_at,
            cut,
        })
    }

    pub fn date(&self) -> String {
        self.recorded_at.format("%Y.%m.%d").to_string()
    }

    pub fn chapter_title(&self) -> String {
        let title = format!(
            "{} {}",
            self.name,
            self.recorded_at.format("%Y.%m.%d %H.%M.%S")
        );
        match &self.cut {
            Some(cut) => format!("{} [{}-{}]", title, cut.start, cut.end),
            None => title,
        }
    }

    fn sort_key(&self) -> (NaiveDateTime, Timestamp) {
        (
            self.recorded_at,
            self.cut.map(|c| c.start).unwrap_or_default(),
        )
    }
}

/// Recording order; trims of one recording follow their start offset.
pub fn sort_clips(clips: &mut [Clip]) {
    clips.sort_by_key(|c| c.sort_key());
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Lays chapters end to end in the given order.
pub fn build_chapters(clips: &[(Clip, Duration)]) -> Vec<Chapter> {
    let mut start_ms = 0;
    clips
        .iter()
        .map(|(clip, length)| {
            let end_ms = start_ms + length.as_millis() as u64;
            let chapter = Chapter {
                title: clip.chapter_title(),
                start_ms,
                end_ms,
            };
            start_ms = end_ms;
            chapter
        })
        .collect()
}
