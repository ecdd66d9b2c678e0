use crate::error::SetupError;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

pub fn ensure_source_dir(dir: &Path) -> Result<(), SetupError> {
    if !dir.exists() {
        return Err(SetupError::SourceMissing(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(SetupError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// `dir/name`, where `name` must be exactly one normal component so the
/// output directory is always a child of `dir`.
pub fn output_dir_path(dir: &Path, name: &str) -> Result<PathBuf, SetupError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(dir.join(name)),
        _ => Err(SetupError::OutputDirName(name.to_string())),
    }
}

/// Creates `dir/name` unless it already exists as a directory.
pub fn ensure_output_dir(dir: &Path, name: &str) -> Result<PathBuf, SetupError> {
    let out = output_dir_path(dir, name)?;
    if out.exists() && !out.is_dir() {
        return Err(SetupError::NotADirectory(out));
    }
    fs::create_dir_all(&out).map_err(|source| SetupError::OutputDir {
        path: out.clone(),
        source,
    })?;
    Ok(out)
}

/// Regular files directly inside `dir` whose extension matches `extension`
/// (case-insensitively), sorted by file name. Subdirectories are not entered.
pub fn list_videos(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SetupError> {
    let listing_error = |source| SetupError::Listing {
        path: dir.to_path_buf(),
        source,
    };
    let mut videos = vec![];
    for entry in fs::read_dir(dir).map_err(listing_error)? {
        let path = entry.map_err(listing_error)?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            videos.push(path);
        }
    }
    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(videos)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
