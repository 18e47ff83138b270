//! Invoke Sen2Cor (`L2A_Process`) on an L1C product and wait for its scene
//! classification output.
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::error::{Error, Result};
use crate::naming::{find_classfiles_at, path_l1c_to_l2a};
use crate::types::{Resolution, Sen2CorParams};

/// Run sen2cor scene classification for an L1C product with default parameters
pub fn run_sen2cor<P: AsRef<Path>>(input: P, resolution: Resolution) -> Result<Vec<PathBuf>> {
    run_sen2cor_with(input, resolution, &Sen2CorParams::default())
}

/// Run sen2cor on `input` and return the classification files it produced.
///
/// The tool runs in the product's parent directory with the product's base
/// name as argument. Its merged stdout/stderr is logged line by line.
pub fn run_sen2cor_with<P: AsRef<Path>>(
    input: P,
    resolution: Resolution,
    params: &Sen2CorParams,
) -> Result<Vec<PathBuf>> {
    check_poll_interval(params)?;

    let input = input.as_ref();
    let safe_base = input.file_name().ok_or_else(|| Error::InvalidArgument {
        arg: "input",
        value: input.display().to_string(),
    })?;
    let workdir = match input.parent() {
        Some(root) if !root.as_os_str().is_empty() => root.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let l2a_path = path_l1c_to_l2a(input);

    let mut args = vec!["--resolution".to_string(), resolution.to_string()];
    if params.sc_only {
        args.push("--sc_only".to_string());
    }
    let command_line = format!(
        "{} {} {}",
        params.command,
        args.join(" "),
        safe_base.to_string_lossy()
    );
    info!("sen2cor command: '{}'", command_line);

    let (output, writer) = std::io::pipe()?;
    // The command must be dropped before reading, so the pipe closes with the child
    let mut child = {
        let mut cmd = Command::new(&params.command);
        cmd.args(&args)
            .arg(safe_base)
            .current_dir(&workdir)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        cmd.spawn()?
    };

    let streamed = stream_output(output);
    let status = child.wait()?;
    streamed?;
    if !status.success() {
        return Err(Error::Process {
            command: command_line,
            code: status.code(),
        });
    }

    wait_for_classfiles(&l2a_path, resolution, params)
}

fn check_poll_interval(params: &Sen2CorParams) -> Result<()> {
    if params.poll_interval.is_zero() {
        return Err(Error::InvalidArgument {
            arg: "poll_interval",
            value: format!("{:?}", params.poll_interval),
        });
    }
    Ok(())
}

fn stream_output<R: Read>(output: R) -> Result<()> {
    let mut reader = BufReader::new(output);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        info!("{}", String::from_utf8_lossy(&line).trim_end());
    }
}

/// Poll for classification files until found or `params.max_wait` is spent.
/// The last look happens once the budget is used up, so a zero budget still
/// checks once.
///
/// A missing L2A directory and an empty match both mean "not written yet";
/// any other error ends the wait.
pub fn wait_for_classfiles(
    l2a_path: &Path,
    resolution: Resolution,
    params: &Sen2CorParams,
) -> Result<Vec<PathBuf>> {
    check_poll_interval(params)?;
    let mut waited = Duration::ZERO;
    loop {
        match find_classfiles_at(l2a_path, resolution) {
            Ok(classfiles) => return Ok(classfiles),
            Err(e) if e.is_not_ready() => {}
            Err(e) => return Err(e),
        }
        if waited >= params.max_wait {
            return Err(Error::Timeout {
                path: l2a_path.to_path_buf(),
                waited,
            });
        }
        if waited.is_zero() {
            info!("Waiting for sen2cor to finish.");
        }
        thread::sleep(params.poll_interval);
        waited += params.poll_interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    const L1C: &str = "S2A_OPER_PRD_MSIL1C_PDMC_20151231T145524.SAFE";
    const L2A: &str = "S2A_USER_PRD_MSIL2A_PDMC_20151231T145524.SAFE";

    fn stub(command: &str) -> Sen2CorParams {
        Sen2CorParams {
            command: command.to_string(),
            poll_interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(50),
            ..Default::default()
        }
    }

    fn write_classfile(l2a: &Path) -> PathBuf {
        let dir = l2a
            .join("GRANULE")
            .join("S2A_USER_MSI_L2A_TL_SGS__20151231T145524_A002658_T32PNA_N02.01")
            .join("IMG_DATA");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("S2A_USER_SCL_L2A_TL_SGS__20151231T145524_A002658_T32PNA_60m.jp2");
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn existing_output_is_returned_without_waiting() {
        let tmp = tempfile::tempdir().unwrap();
        let classfile = write_classfile(&tmp.path().join(L2A));
        let params = Sen2CorParams {
            command: "true".to_string(),
            ..Default::default()
        };

        let start = Instant::now();
        let found = run_sen2cor_with(tmp.path().join(L1C), Resolution::R60, &params).unwrap();
        assert_eq!(found, vec![classfile]);
        assert!(start.elapsed() < params.poll_interval);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber that records INFO events as plain text
    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, logs)
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake_sen2cor.sh");
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn tool_output_is_streamed() {
        let tmp = tempfile::tempdir().unwrap();
        let classfile = write_classfile(&tmp.path().join(L2A));

        let (found, logs) = capture_logs(|| {
            run_sen2cor_with(tmp.path().join(L1C), Resolution::R60, &stub("echo"))
        });
        assert_eq!(found.unwrap(), vec![classfile]);
        assert!(logs.contains("sen2cor command: 'echo --resolution 60 --sc_only"));
        let echoed = format!("--resolution 60 --sc_only {}", L1C);
        assert!(
            logs.lines()
                .any(|line| line.contains("INFO") && line.ends_with(&echoed)),
            "{logs}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn stdout_and_stderr_share_one_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let classfile = write_classfile(&tmp.path().join(L2A));
        let script = write_script(
            tmp.path(),
            "echo 'Progress[ 50%]: on stdout'\necho 'Warning: on stderr' >&2\necho 'Progress[100%]: done'\n",
        );

        let (found, logs) = capture_logs(|| {
            run_sen2cor_with(tmp.path().join(L1C), Resolution::R60, &stub(&script))
        });
        assert_eq!(found.unwrap(), vec![classfile]);

        let tool_lines: Vec<&str> = logs
            .lines()
            .filter(|line| line.contains(": on std") || line.contains(": done"))
            .collect();
        assert_eq!(tool_lines.len(), 3, "{logs}");
        assert!(tool_lines.iter().all(|line| line.contains("INFO")));
        assert!(tool_lines[0].ends_with("Progress[ 50%]: on stdout"));
        assert!(tool_lines[1].ends_with("Warning: on stderr"));
        assert!(tool_lines[2].ends_with("Progress[100%]: done"));
    }

    #[test]
    fn waiting_is_announced_once() {
        let tmp = tempfile::tempdir().unwrap();
        let l2a = tmp.path().join(L2A);

        let (result, logs) =
            capture_logs(|| wait_for_classfiles(&l2a, Resolution::R60, &stub("true")));
        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert_eq!(logs.matches("Waiting for sen2cor to finish.").count(), 1);
    }

    #[test]
    fn zero_budget_still_looks_once() {
        let tmp = tempfile::tempdir().unwrap();
        let l2a = tmp.path().join(L2A);
        let classfile = write_classfile(&l2a);
        let params = Sen2CorParams {
            max_wait: Duration::ZERO,
            ..stub("true")
        };

        assert_eq!(
            wait_for_classfiles(&l2a, Resolution::R60, &params).unwrap(),
            vec![classfile]
        );
        fs::remove_dir_all(&l2a).unwrap();
        match wait_for_classfiles(&l2a, Resolution::R60, &params).unwrap_err() {
            Error::Timeout { waited, .. } => assert_eq!(waited, Duration::ZERO),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn last_look_happens_when_budget_runs_out() {
        let tmp = tempfile::tempdir().unwrap();
        let l2a = tmp.path().join(L2A);
        let params = Sen2CorParams {
            poll_interval: Duration::from_millis(300),
            max_wait: Duration::from_millis(300),
            ..stub("true")
        };

        let writer = {
            let l2a = l2a.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                write_classfile(&l2a)
            })
        };
        let found = wait_for_classfiles(&l2a, Resolution::R60, &params).unwrap();
        assert_eq!(found, vec![writer.join().unwrap()]);
    }

    #[test]
    fn failing_tool_is_a_process_error() {
        let tmp = tempfile::tempdir().unwrap();
        let params = Sen2CorParams {
            command: "false".to_string(),
            max_wait: Duration::from_secs(3600),
            ..Default::default()
        };

        let start = Instant::now();
        match run_sen2cor_with(tmp.path().join(L1C), Resolution::R60, &params).unwrap_err() {
            Error::Process { command, code } => {
                assert_eq!(code, Some(1));
                assert_eq!(command, format!("false --resolution 60 --sc_only {}", L1C));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(start.elapsed() < params.poll_interval);
    }

    #[test]
    fn missing_tool_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = run_sen2cor_with(
            tmp.path().join(L1C),
            Resolution::R60,
            &stub("/nonexistent/L2A_Process"),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn waiting_gives_up_after_budget() {
        let tmp = tempfile::tempdir().unwrap();
        match run_sen2cor_with(tmp.path().join(L1C), Resolution::R60, &stub("true")).unwrap_err() {
            Error::Timeout { path, waited } => {
                assert_eq!(path, tmp.path().join(L2A));
                assert_eq!(waited, Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn late_output_is_picked_up() {
        let tmp = tempfile::tempdir().unwrap();
        let l2a = tmp.path().join(L2A);
        let params = Sen2CorParams {
            max_wait: Duration::from_secs(10),
            ..stub("true")
        };

        let writer = {
            let l2a = l2a.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                write_classfile(&l2a)
            })
        };
        let found = wait_for_classfiles(&l2a, Resolution::R60, &params).unwrap();
        assert_eq!(found, vec![writer.join().unwrap()]);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let params = Sen2CorParams {
            poll_interval: Duration::ZERO,
            ..stub("true")
        };
        assert!(matches!(
            run_sen2cor_with(L1C, Resolution::R60, &params),
            Err(Error::InvalidArgument { arg: "poll_interval", .. })
        ));
        assert!(matches!(
            wait_for_classfiles(Path::new(L2A), Resolution::R60, &params),
            Err(Error::InvalidArgument { arg: "poll_interval", .. })
        ));
    }
}
