use anyhow::{anyhow, Result};
use std::{fmt, str::FromStr, time::Duration};

/// `HH.MM.SS.mmm`, the notation recorders use in clip file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub hr: u32,
    pub min: u32,
    pub sec: u32,
    pub msec: u32,
}

impl Timestamp {
    pub fn from_millis(total: u64) -> Self {
        let secs = total / 1000;
        let mins = secs / 60;
        Self {
            hr: (mins / 60) as u32,
            min: (mins % 60) as u32,
            sec: (secs % 60) as u32,
            msec: (total % 1000) as u32,
        }
    }

    /// Truncates below the millisecond.
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_millis(duration.as_millis() as u64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}.{:02}.{:02}.{:03}",
            self.hr, self.min, self.sec, self.msec
        )
    }
}

impl FromStr for Timestamp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| anyhow!("invalid timestamp {:?}", s))?;
        match parts[..] {
            [hr, min, sec, msec] if min < 60 && sec < 60 && msec < 1000 => {
                Ok(Self { hr, min, sec, msec })
            }
            _ => Err(anyhow!("invalid timestamp {:?}", s)),
        }
    }
}
