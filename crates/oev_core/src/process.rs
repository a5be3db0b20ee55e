//! Subprocess helpers shared by the probe and the tool adapters.

use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Whether `program` resolves on the search path (or is an existing path).
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Render a command line for logging.
pub fn render_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Run a command to completion, killing it once `limit` elapses.
///
/// Timeouts surface as `io::ErrorKind::TimedOut`.
pub fn run_with_timeout(mut command: Command, limit: Duration) -> io::Result<Output> {
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn()?;
    let started_at = Instant::now();

    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    loop {
        if let Some(status) = child.try_wait()? {
            let stdout = stdout_rx
                .recv_timeout(Duration::from_millis(100))
                .unwrap_or_default();
            let stderr = stderr_rx
                .recv_timeout(Duration::from_millis(100))
                .unwrap_or_default();
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if started_at.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("command timed out after {} ms", limit.as_millis()),
            ));
        }

        thread::sleep(Duration::from_millis(20));
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> std::sync::mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = std::sync::mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_command_line() {
        assert_eq!(render_command("ffmpeg", &[]), "ffmpeg");
        assert_eq!(
            render_command("ffmpeg", &["-i".to_string(), "a.mp3".to_string()]),
            "ffmpeg -i a.mp3"
        );
    }

    #[test]
    fn missing_program_does_not_exist() {
        assert!(!command_exists("definitely-not-a-real-binary-oev"));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo hello"]);
        let output = run_with_timeout(command, Duration::from_secs(5)).unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn kills_on_timeout() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 5"]);
        let err = run_with_timeout(command, Duration::from_millis(100)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
