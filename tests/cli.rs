use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_works() {
    let mut cmd = Command::cargo_bin("clipkit").unwrap();
    cmd.arg("--help").assert().success();
}

#[test]
fn compress_requires_a_bitrate() {
    let mut cmd = Command::cargo_bin("clipkit").unwrap();
    cmd.args(["compress", "."]).assert().failure();
}

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};
    use tempfile::TempDir;

    // Byte-for-byte copies of the scripts in `src/ffmpeg/mod.rs` (`fake`).
    // Keep the two in sync when either changes.
    const FFPROBE: &str = r#"#!/bin/sh
for last; do :; done
word=$(head -c 64 "$last" | cut -d' ' -f1)
if [ "$word" = "corrupt" ]; then
  echo "$last: Invalid data found when processing input" >&2
  exit 1
fi
case "$*" in
  *format=duration*) printf '{"format":{"duration":"%s"}}' "${FAKE_DURATION:-12.5}" ;;
  *) printf '{"streams":[{"bit_rate":"%s"}]}' "$word" ;;
esac
"#;

    const FFMPEG: &str = r#"#!/bin/sh
prev=""
for arg; do
  if [ "$prev" = "-i" ]; then input="$arg"; fi
  prev="$arg"
  out="$arg"
done
if grep -q hang "$input"; then exec sleep 30; fi
if grep -q fail "$input"; then
  echo partial > "$out"
  echo "Error while encoding" >&2
  exit 1
fi
cp "$input" "$out"
"#;

    struct Fixture {
        bin: TempDir,
        src: TempDir,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)]) -> Self {
            let bin = TempDir::new().unwrap();
            for (name, body) in [("ffmpeg", FFMPEG), ("ffprobe", FFPROBE)] {
                let path = bin.path().join(name);
                fs::write(&path, body).unwrap();
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
            let src = TempDir::new().unwrap();
            for (name, contents) in files {
                fs::write(src.path().join(name), contents).unwrap();
            }
            Self { bin, src }
        }

        fn clipkit(&self) -> Command {
            let mut cmd = Command::cargo_bin("clipkit").unwrap();
            cmd.env("FFMPEG", self.bin.path().join("ffmpeg"))
                .env("FFPROBE", self.bin.path().join("ffprobe"))
                .env("FAKE_DURATION", "3.0")
                .env("CLIPKIT_LOG", "info");
            cmd
        }

        fn compressed(&self) -> Vec<String> {
            list(&self.src.path().join("compressed"))
        }
    }

    fn list(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn high_bitrate_clip_is_compressed() {
        let fx = Fixture::new(&[("a.mp4", "5000000")]);
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path())
            .arg("3")
            .assert()
            .success()
            .stdout(predicate::str::contains("processed=1 skipped=0 failed=0"));
        assert_eq!(fx.compressed(), vec!["a.mp4"]);
    }

    #[test]
    fn clip_within_tolerance_is_skipped() {
        let fx = Fixture::new(&[("b.mp4", "3500000")]);
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path())
            .arg("3")
            .assert()
            .success()
            .stdout(predicate::str::contains("b.mp4: skipped, bitrate 3500000 bps"));
        assert!(fx.compressed().is_empty());
    }

    #[test]
    fn empty_directory_still_gets_output_dir() {
        let fx = Fixture::new(&[]);
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path())
            .arg("3")
            .assert()
            .success();
        assert!(fx.compressed().is_empty());
    }

    #[test]
    fn corrupt_clip_is_reported_and_others_continue() {
        let fx = Fixture::new(&[
            ("a.mp4", "5000000"),
            ("c.mp4", "corrupt"),
            ("d.mp4", "6000000"),
        ]);
        let report = fx.src.path().join("report.csv");
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path())
            .arg("3")
            .arg("--report")
            .arg(&report)
            .assert()
            .code(2)
            .stdout(predicate::str::contains("processed=2 skipped=0 failed=1"));
        assert_eq!(fx.compressed(), vec!["a.mp4", "d.mp4"]);
        let csv = fs::read_to_string(report).unwrap();
        assert!(csv.contains("c.mp4,probe failed,,"));
    }

    #[test]
    fn failed_encode_exits_with_two_and_leaves_no_partial() {
        let fx = Fixture::new(&[("a.mp4", "9000000 fail")]);
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path())
            .arg("3")
            .assert()
            .code(2);
        assert!(fx.compressed().is_empty());
    }

    #[test]
    fn missing_source_is_fatal() {
        let fx = Fixture::new(&[]);
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path().join("missing"))
            .arg("3")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("does not exist"));
    }

    #[test]
    fn output_dir_taken_by_a_file_is_fatal() {
        let fx = Fixture::new(&[("compressed", ""), ("a.mp4", "5000000")]);
        fx.clipkit()
            .arg("compress")
            .arg(fx.src.path())
            .arg("3")
            .assert()
            .code(1);
    }

    #[test]
    fn probe_lists_decisions() {
        let fx = Fixture::new(&[("a.mp4", "5000000"), ("b.mp4", "3500000")]);
        fx.clipkit()
            .arg("probe")
            .arg(fx.src.path())
            .args(["--bitrate", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("transcode"))
            .stdout(predicate::str::contains("skip"));
    }

    #[test]
    fn concat_writes_output_next_to_clips() {
        let fx = Fixture::new(&[
            ("Game 2025.07.13 - 02.09.03.696.DVR.mp4", "1"),
            ("Game 2025.07.13 - 03.39.22.704.DVR.mp4", "1"),
        ]);
        fx.clipkit()
            .arg("concat")
            .arg(fx.src.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("(2 chapters)"));
        let out = fx.src.path().join("Game 2025.07.13.mp4");
        let metadata = fs::read_to_string(out).unwrap();
        assert!(metadata.contains("START=3000\nEND=6000\ntitle=Game 2025.07.13 03.39.22"));
    }

    #[test]
    fn concat_refuses_a_relative_out_that_names_a_clip() {
        let clip = "Game 2025.07.13 - 02.09.03.696.DVR.mp4";
        let fx = Fixture::new(&[(clip, "1"), ("Game 2025.07.13 - 03.39.22.704.DVR.mp4", "1")]);
        fx.clipkit()
            .current_dir(fx.src.path())
            .args(["concat", ".", "--out", clip])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("would overwrite"));
        fx.clipkit()
            .current_dir(fx.src.path().parent().unwrap())
            .arg("concat")
            .arg(fx.src.path().file_name().unwrap())
            .arg("--out")
            .arg(Path::new(fx.src.path().file_name().unwrap()).join(clip))
            .assert()
            .code(1);
        assert_eq!(fs::read_to_string(fx.src.path().join(clip)).unwrap(), "1");
    }

    #[test]
    fn output_dir_name_dot_is_rejected() {
        let fx = Fixture::new(&[("a.mp4", "5000000 original")]);
        for name in [".", ""] {
            fx.clipkit()
                .arg("compress")
                .arg(fx.src.path())
                .arg("3")
                .args(["--output-dir-name", name])
                .assert()
                .code(1)
                .stderr(predicate::str::contains("single plain path component"));
        }
        assert_eq!(
            fs::read_to_string(fx.src.path().join("a.mp4")).unwrap(),
            "5000000 original"
        );
    }
}
