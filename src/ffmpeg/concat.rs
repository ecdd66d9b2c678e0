use super::{os, write_atomically, Tools};
use crate::clip::Chapter;
use anyhow::{Context, Result};
use std::{io::Write, path::Path};
use tempfile::NamedTempFile;

/// Input list for the concat demuxer.
pub fn concat_list(files: &[&Path]) -> String {
    files
        .iter()
        .map(|f| {
            let path = f.display().to_string().replace('\'', r"'\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

fn escape_metadata(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// FFMETADATA1 document holding one chapter per clip.
pub fn ffmetadata(chapters: &[Chapter]) -> String {
    let mut doc = String::from(";FFMETADATA1\n");
    for chapter in chapters {
        doc.push_str(&format!(
            "\n[CHAPTER]\nTIMEBASE=1/1000\nSTART={}\nEND={}\ntitle={}\n",
            chapter.start_ms,
            chapter.end_ms,
            escape_metadata(&chapter.title)
        ));
    }
    doc
}

fn write_temp(suffix: &str, contents: &str) -> Result<NamedTempFile> {
    let mut temp = tempfile::Builder::new().suffix(suffix).tempfile()?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    Ok(temp)
}

/// Stream-copies `files` into `out` with `chapters` embedded.
pub fn concat_with_chapters(
    tools: &Tools,
    files: &[&Path],
    chapters: &[Chapter],
    out: &Path,
) -> Result<()> {
    let list = write_temp(".txt", &concat_list(files))?;
    let metadata = write_temp(".ffmeta", &ffmetadata(chapters))?;
    log::debug!("concat list:\n{}", concat_list(files));

    write_atomically(out, |partial| {
        tools.ffmpeg(vec![
            os("-f"),
            os("concat"),
            os("-safe"),
            os("0"),
            os("-i"),
            os(list.path()),
            os("-i"),
            os(metadata.path()),
            os("-map"),
            os("0"),
            os("-map_metadata"),
            os("1"),
            os("-map_chapters"),
            os("1"),
            os("-c"),
            os("copy"),
            os("-f"),
            os("mp4"),
            os(partial),
        ])
    })
    .with_context(|| format!("concat into {}", out.display()))
}
