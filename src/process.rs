//! Child process execution with optional log teeing.
//!
//! The build and install tools are invoked either directly or through
//! `/bin/sh -c`. When a build log is attached, the child's stdout and
//! stderr are joined into a single pipe and streamed to both the caller's
//! stdout and the log file, so the operator watches the build while the log
//! captures it.

use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};

/// Exit value reported when the child could not be spawned or awaited.
pub const EXEC_FAILURE: i32 = -1;

/// What: Run a command directly (no shell), splitting its argument string
/// on whitespace.
///
/// Inputs:
/// - `command`: Path of the executable.
/// - `arguments`: Argument string; empty tokens are dropped.
/// - `log`: Build log to tee the child's combined output into.
///
/// Output:
/// - Returns the raw wait status of the child, or [`EXEC_FAILURE`] when it
///   could not be spawned or awaited. A zero return means success.
#[must_use]
pub fn run_command(command: &str, arguments: &str, log: Option<&File>) -> i32 {
    let mut cmd = Command::new(command);
    cmd.args(arguments.split_whitespace());
    tracing::debug!("Running: {} {}", command, arguments);
    execute(cmd, log)
}

/// What: Run a command line through `/bin/sh -c`.
///
/// Inputs:
/// - `command_line`: The shell command line.
/// - `log`: Build log to tee the child's combined output into.
///
/// Output:
/// - As for [`run_command`].
#[must_use]
pub fn run_shell(command_line: &str, log: Option<&File>) -> i32 {
    let mut cmd = Command::new("/bin/sh");
    cmd.args(["-c", command_line]);
    tracing::debug!("Running: /bin/sh -c {:?}", command_line);
    execute(cmd, log)
}

/// Spawn and wait, teeing when a log is attached.
fn execute(cmd: Command, log: Option<&File>) -> i32 {
    match log {
        Some(log) => execute_teed(cmd, log),
        None => execute_inherited(cmd),
    }
}

/// Run with inherited descriptors.
fn execute_inherited(mut cmd: Command) -> i32 {
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            tracing::error!("Failed to spawn {:?}: {}", cmd.get_program(), err);
            return EXEC_FAILURE;
        }
    };
    match child.wait() {
        Ok(status) => status.into_raw(),
        Err(err) => {
            tracing::error!("Failed to wait for child: {}", err);
            EXEC_FAILURE
        }
    }
}

/// Run with stdout and stderr joined into one pipe, streaming every chunk
/// to our stdout and the log. The read loop drains the pipe until the
/// child (and any inheritors of the write end) closed it, then reaps the
/// child.
fn execute_teed(mut cmd: Command, log: &File) -> i32 {
    let (read_end, write_end) = match rustix::pipe::pipe() {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!("Failed to create pipe: {}", err);
            return EXEC_FAILURE;
        }
    };
    let write_dup = match write_end.try_clone() {
        Ok(dup) => dup,
        Err(err) => {
            tracing::error!("Failed to duplicate pipe: {}", err);
            return EXEC_FAILURE;
        }
    };

    cmd.stdout(Stdio::from(write_end));
    cmd.stderr(Stdio::from(write_dup));

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            tracing::error!("Failed to spawn {:?}: {}", cmd.get_program(), err);
            return EXEC_FAILURE;
        }
    };
    // Close our copies of the write end so the pipe reaches EOF when the
    // child exits.
    drop(cmd);

    let mut reader = File::from(read_end);
    let mut stdout = std::io::stdout();
    let mut log = log;
    let mut buffer = [0_u8; 1024];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(bytes) => {
                let _ = stdout.write_all(&buffer[..bytes]);
                let _ = stdout.flush();
                let _ = log.write_all(&buffer[..bytes]);
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => {
                tracing::error!("Failed to read child output: {}", err);
                break;
            }
        }
    }

    match child.wait() {
        Ok(status) => status.into_raw(),
        Err(err) => {
            tracing::error!("Failed to wait for child: {}", err);
            EXEC_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Seek;

    #[test]
    fn test_run_shell_reports_exit_status() {
        assert_eq!(run_shell("exit 0", None), 0);
        assert_ne!(run_shell("exit 3", None), 0);
    }

    #[test]
    fn test_run_command_direct() {
        assert_eq!(run_command("/bin/sh", "-c true", None), 0);
        assert_ne!(run_command("/bin/sh", "-c false", None), 0);
    }

    #[test]
    fn test_spawn_failure_is_minus_one() {
        assert_eq!(
            run_command("/nonexistent/binary", "", None),
            EXEC_FAILURE
        );
    }

    #[test]
    fn test_combined_output_is_teed_to_log() {
        let mut log = tempfile::tempfile().expect("tempfile");
        let status = run_shell("echo out-line; echo err-line >&2", Some(&log));
        assert_eq!(status, 0);

        let mut contents = String::new();
        log.rewind().expect("rewind");
        log.read_to_string(&mut contents).expect("read");
        assert!(contents.contains("out-line"));
        assert!(contents.contains("err-line"));
    }

    #[test]
    fn test_log_captures_output_of_failing_child() {
        let mut log = tempfile::tempfile().expect("tempfile");
        let status = run_shell("echo before-failure; exit 7", Some(&log));
        assert_ne!(status, 0);

        let mut contents = String::new();
        log.rewind().expect("rewind");
        log.read_to_string(&mut contents).expect("read");
        assert!(contents.contains("before-failure"));
    }
}
