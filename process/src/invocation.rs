use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::ProcessError;

/// Default wall-clock limit for a single invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A single run of an external program.
///
/// The child never inherits stdin, and both output streams are captured.
/// On unix the child leads its own process group, so a timeout or a dropped
/// future kills everything it spawned, not just the direct child.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    timeout: Duration,
}

/// Captured result of a finished invocation.
#[derive(Debug)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Output {
    /// Returns true if the program exited with status zero.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or `None` when the program was terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Sets the wall-clock limit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Renders the command line for log messages.
    pub fn command_line(&self) -> String {
        let mut line = self.program_name();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Runs the program to completion.
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// [`Output::success`]. When the timeout elapses the child is killed and
    /// reaped before [`ProcessError::Timeout`] is returned.
    pub async fn run(&self) -> Result<Output, ProcessError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: self.program_name(),
            source,
        })?;

        debug!("spawned `{}` (pid {:?})", self.command_line(), child.id());

        // Declared after `child` so it drops first, while the group leader
        // is still unreaped and the group id cannot be recycled.
        let mut group = GroupGuard::new(child.id());

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let finished = tokio::time::timeout(self.timeout, async {
            let (status, out, err) = tokio::join!(
                child.wait(),
                read_pipe(stdout.as_mut()),
                read_pipe(stderr.as_mut())
            );
            Ok::<_, io::Error>((status?, out?, err?))
        })
        .await;

        match finished {
            Ok(Ok((status, stdout, stderr))) => {
                group.disarm();
                debug!("`{}` exited with {}", self.program_name(), status);
                Ok(Output {
                    status,
                    stdout,
                    stderr,
                })
            }
            Ok(Err(source)) => {
                group.kill();
                Err(ProcessError::Io {
                    program: self.program_name(),
                    source,
                })
            }
            Err(_) => {
                warn!(
                    "`{}` exceeded {:?}, killing its process group",
                    self.program_name(),
                    self.timeout
                );
                group.kill();
                if let Err(e) = child.kill().await {
                    warn!("failed to kill `{}`: {}", self.program_name(), e);
                }
                Err(ProcessError::Timeout {
                    program: self.program_name(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

/// Kills the child's process group when dropped, unless disarmed.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // A negative pid signals every member of the group.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("failed to kill process group {}: {}", pgid, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<&mut R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Trims diagnostic text to at most `max` bytes on a char boundary.
pub fn truncate_diagnostic(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let out = Invocation::new("sh")
            .args(["-c", "echo out; echo err >&2"])
            .run()
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_text().trim(), "out");
        assert_eq!(out.stderr_text().trim(), "err");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let out = Invocation::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .run()
            .await
            .unwrap();
        assert!(!out.success());
        assert_eq!(out.code(), Some(3));
        assert_eq!(out.stderr_text().trim(), "boom");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = Invocation::new("voxguard-definitely-not-installed")
            .run()
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("failed to start"));
    }

    #[tokio::test]
    async fn test_timeout_kills_the_child() {
        let started = std::time::Instant::now();
        let err = Invocation::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(100))
            .run()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// Script that records its pid (the group id) and then blocks in a
    /// grandchild `sleep`.
    fn compound_script(pid_file: &std::path::Path) -> Invocation {
        let script = format!(
            "echo $$ > {}; sleep 30 && echo marker; echo done",
            pid_file.display()
        );
        Invocation::new("sh").args(["-c", &script])
    }

    async fn read_pgid(pid_file: &std::path::Path) -> libc::pid_t {
        for _ in 0..50 {
            if let Ok(text) = tokio::fs::read_to_string(pid_file).await
                && let Ok(pid) = text.trim().parse()
            {
                return pid;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("script never wrote {}", pid_file.display());
    }

    /// Waits until no process is left in the group.
    async fn assert_group_gone(pgid: libc::pid_t) {
        for _ in 0..100 {
            let rc = unsafe { libc::kill(-pgid, 0) };
            if rc != 0 && io::Error::last_os_error().raw_os_error() == Some(libc::ESRCH) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("process group {} still has live members", pgid);
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");

        let err = compound_script(&pid_file)
            .timeout(Duration::from_millis(300))
            .run()
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        assert_group_gone(read_pgid(&pid_file).await).await;
    }

    #[tokio::test]
    async fn test_dropped_run_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");

        let inv = compound_script(&pid_file).timeout(Duration::from_secs(60));
        let cancelled = tokio::time::timeout(Duration::from_millis(300), inv.run()).await;
        assert!(cancelled.is_err());

        assert_group_gone(read_pgid(&pid_file).await).await;
    }

    #[test]
    fn test_command_line_joins_args() {
        let inv = Invocation::new("ffmpeg").args(["-i", "in.mp3"]).arg("out.wav");
        assert_eq!(inv.command_line(), "ffmpeg -i in.mp3 out.wav");
        assert_eq!(inv.program_name(), "ffmpeg");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_diagnostic("  short  ", 16), "short");
        assert_eq!(truncate_diagnostic("abcdef", 3), "abc...");
        // 'é' is two bytes; cutting at 2 would split it.
        assert_eq!(truncate_diagnostic("aé", 2), "a...");
    }
}
