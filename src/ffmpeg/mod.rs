use crate::error::{ToolError, TranscodeError};
use std::{
    ffi::{OsStr, OsString},
    fs,
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

pub mod concat;
pub mod probe;
pub mod transcode;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_TAIL_LINES: usize = 20;

/// Shared interrupt flag, set from the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Locations of the external tools plus the limits applied to every invocation.
#[derive(Debug, Clone)]
pub struct Tools {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub timeout: Option<Duration>,
    pub cancel: CancelFlag,
}

impl Tools {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn ffmpeg(&self, args: Vec<OsString>) -> Result<ToolOutput, ToolError> {
        let args = vec![
            vec![
                "-hide_banner".into(),
                "-loglevel".into(),
                "warning".into(),
                "-nostdin".into(),
                "-y".into(),
            ],
            args,
        ]
        .concat();
        self.run(&self.ffmpeg_path, &args)
    }

    pub fn ffprobe(&self, args: Vec<OsString>) -> Result<ToolOutput, ToolError> {
        let args = vec![vec!["-v".into(), "error".into()], args].concat();
        self.run(&self.ffprobe_path, &args)
    }

    /// Runs `program` to completion, draining both output pipes so the child
    /// never blocks on a full pipe. The child is killed and reaped on timeout
    /// or cancellation.
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput, ToolError> {
        let tool = program.display().to_string();
        log::debug!("{} {}", tool, display_args(args));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: tool.clone(),
                source,
            })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) => {}
                Err(e) => break Err(ToolError::Io(e)),
            }
            if self.cancel.is_cancelled() {
                break Err(ToolError::Cancelled { tool: tool.clone() });
            }
            if let Some(after) = self.timeout {
                if started.elapsed() >= after {
                    break Err(ToolError::TimedOut {
                        tool: tool.clone(),
                        after,
                    });
                }
            }
            thread::sleep(POLL_INTERVAL);
        };
        if status.is_err() {
            let _ = child.kill();
            let _ = child.wait();
        }

        let output = ToolOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        let status = status?;
        if !status.success() {
            return Err(ToolError::Failed {
                tool,
                code: status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = vec![];
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines = text.trim().lines().collect::<Vec<_>>();
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[skip..].join("\n")
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn os(arg: impl AsRef<OsStr>) -> OsString {
    arg.as_ref().to_os_string()
}

/// Sibling path ffmpeg writes into before the result is moved into place.
pub fn partial_path(out: &Path) -> PathBuf {
    let name = out
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    out.with_file_name(format!(".{}.part", name))
}

/// Lets `write` produce the file at a hidden partial path and moves it onto
/// `out` only when it succeeds. The partial file never outlives a failure.
pub fn write_atomically<F>(out: &Path, write: F) -> Result<(), TranscodeError>
where
    F: FnOnce(&Path) -> Result<ToolOutput, ToolError>,
{
    let partial = partial_path(out);
    if let Err(e) = write(&partial) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    fs::rename(&partial, out).map_err(|source| {
        let _ = fs::remove_file(&partial);
        TranscodeError::Finalize {
            from: partial.clone(),
            source,
        }
    })
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn failed_tool_reports_exit_code_and_stderr() {
        let dir = TempDir::new().unwrap();
        let script = fake::script(dir.path(), "tool", "#!/bin/sh\necho boom >&2\nexit 3\n");
        let tools = Tools::new(&script, &script);
        match tools.run(&script, &[]) {
            Err(ToolError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn timeout_kills_the_child() {
        let dir = TempDir::new().unwrap();
        let script = fake::script(dir.path(), "tool", "#!/bin/sh\nexec sleep 30\n");
        let tools = Tools::new(&script, &script).with_timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let err = tools.run(&script, &[]).unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn cancelled_flag_stops_the_child() {
        let dir = TempDir::new().unwrap();
        let script = fake::script(dir.path(), "tool", "#!/bin/sh\nexec sleep 30\n");
        let cancel = CancelFlag::new();
        cancel.cancel();
        let tools = Tools::new(&script, &script).with_cancel(cancel);
        assert!(matches!(
            tools.run(&script, &[]),
            Err(ToolError::Cancelled { .. })
        ));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let tools = Tools::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        let err = tools.ffprobe(vec![]).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let text = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(text.as_bytes());
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.ends_with("29"));
    }

    #[test]
    fn partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/v/compressed/a b.mp4")),
            PathBuf::from("/v/compressed/.a b.mp4.part")
        );
    }
}
