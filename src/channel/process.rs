//! Tool process spawning and line exchange.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::config::ChannelConfig;
use crate::encoding::TextEncoding;

use super::state::{ChannelState, ChannelStatus, RunningTool};
use super::stream::{LineReader, LineWriter};
use super::{ChannelError, LifecycleError, SpawnError};

/// Shim that disables stdio buffering in the wrapped tool.
const STDBUF_PROGRAM: &str = "stdbuf";
const STDBUF_ARGS: [&str; 2] = ["-i0", "-o0"];

/// A synchronous, line-oriented channel to a tool process.
///
/// Every call blocks: [`writeline`](Self::writeline) until the pipe accepts
/// the record, [`readline`](Self::readline) until the tool emits one. The
/// tool is killed and reaped by [`close`](Self::close), which also runs on
/// drop.
///
/// ```no_run
/// use toolwrapper::{ChannelConfig, ProcessChannel};
///
/// let mut sed = ProcessChannel::new(ChannelConfig::new(["sed", "s/Hello/Hi/"]))?;
/// sed.writeline("Hello there!")?;
/// assert_eq!(sed.readline()?, "Hi there!");
/// sed.close();
/// # Ok::<(), toolwrapper::ChannelError>(())
/// ```
pub struct ProcessChannel {
    config: ChannelConfig,
    state: ChannelState,
}

impl ProcessChannel {
    /// Create a channel, starting the tool if `config.auto_start` is set.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Spawn` if auto-start fails to launch the tool.
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelError> {
        let mut channel = Self {
            config,
            state: ChannelState::Unstarted,
        };
        if channel.config.auto_start {
            channel.start()?;
        }
        Ok(channel)
    }

    /// Spawn `command` with default options.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Spawn` if the tool cannot be launched.
    pub fn spawn<I, S>(command: I) -> Result<Self, ChannelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ChannelConfig::new(command))
    }

    /// Get the channel configuration.
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Get the tool command and arguments.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.config.command
    }

    /// Get the text encoding of the tool's pipes.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.config.encoding
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.config.get_working_dir()
    }

    /// Whether the tool runs under the `stdbuf` buffering fix.
    #[must_use]
    pub fn uses_stdbuf(&self) -> bool {
        self.config.stdbuf
    }

    /// Get the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ChannelStatus {
        self.state.status()
    }

    /// Whether a tool process is currently owned by the channel.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, ChannelState::Running(_))
    }

    /// Process id of the running tool.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match &self.state {
            ChannelState::Running(tool) => Some(tool.pid()),
            _ => None,
        }
    }

    /// The argv that [`start`](Self::start) executes.
    ///
    /// With the buffering fix enabled and `stdbuf` on `PATH`, the command is
    /// prefixed with `stdbuf -i0 -o0`. A missing `stdbuf` is logged and the
    /// plain command is used.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::EmptyCommand` if no program is configured, and
    /// `SpawnError::NotFound` or `SpawnError::PermissionDenied` if the shim
    /// is used and the program cannot be executed (the shim itself would
    /// launch and then exit).
    pub fn resolved_command(&self) -> Result<Vec<OsString>, SpawnError> {
        let program = self.config.command.first().ok_or(SpawnError::EmptyCommand)?;
        let mut argv: Vec<OsString> = Vec::with_capacity(self.config.command.len() + 3);

        if self.config.stdbuf {
            match which::which(STDBUF_PROGRAM) {
                Ok(stdbuf) => {
                    self.locate_program(program)?;
                    argv.push(stdbuf.into_os_string());
                    argv.extend(STDBUF_ARGS.into_iter().map(OsString::from));
                }
                Err(e) => tracing::warn!(
                    error = %e,
                    "stdbuf not available; communication may hang if the tool buffers its output"
                ),
            }
        }

        argv.extend(self.config.command.iter().map(OsString::from));
        Ok(argv)
    }

    /// Check that `program` can be executed before handing it to the shim.
    ///
    /// Resolution mirrors `execvp`: a name containing `/` is taken relative
    /// to the working directory, a bare name is searched on `PATH`. The
    /// error comes from an `access(2)` check on the resolved file.
    #[cfg(unix)]
    fn locate_program(&self, program: &str) -> Result<(), SpawnError> {
        use nix::errno::Errno;
        use nix::unistd::{access, AccessFlags};

        let cwd = match self.config.get_working_dir() {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };

        let path = if program.contains('/') {
            cwd.join(program)
        } else if which::which_in(program, std::env::var_os("PATH"), &cwd).is_ok() {
            return Ok(());
        } else {
            // Not executable anywhere on PATH; report the first plain match.
            let first_match = std::env::var_os("PATH").and_then(|paths| {
                std::env::split_paths(&paths)
                    .map(|dir| dir.join(program))
                    .find(|candidate| candidate.is_file())
            });
            match first_match {
                Some(path) => path,
                None => return Err(SpawnError::from_io(program, Errno::ENOENT.into())),
            }
        };

        access(&path, AccessFlags::X_OK).map_err(|e| SpawnError::from_io(program, e.into()))?;
        if path.is_dir() {
            return Err(SpawnError::from_io(program, Errno::EACCES.into()));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    fn locate_program(&self, _program: &str) -> Result<(), SpawnError> {
        Ok(())
    }

    /// Launch the tool with all three standard streams piped.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::NotClosed` if the tool is already running
    /// (nothing is spawned), or `ChannelError::Spawn` if launching fails.
    /// The channel status is unchanged on error.
    pub fn start(&mut self) -> Result<(), ChannelError> {
        if self.is_running() {
            return Err(LifecycleError::NotClosed.into());
        }

        let argv = self.resolved_command()?;
        let program = &self.config.command[0];
        tracing::info!(argv = ?self.config.command, "Executing tool");

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| SpawnError::from_io(program, e))?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SpawnError::Io(std::io::Error::other("tool pipes were not captured")).into());
        };

        let encoding = self.config.encoding;
        let tool = RunningTool {
            child,
            stdin: LineWriter::new(stdin, encoding),
            stdout: LineReader::new(stdout, encoding),
            stderr: LineReader::new(stderr, encoding),
        };
        tracing::info!(pid = tool.pid(), "Spawned tool process");
        self.state = ChannelState::Running(tool);
        Ok(())
    }

    /// Close then start again, yielding a fresh process.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Spawn` if the new process cannot be launched;
    /// the channel is left not running.
    pub fn restart(&mut self) -> Result<(), ChannelError> {
        self.close();
        self.start()
    }

    /// Kill and reap the tool, then release its pipes.
    ///
    /// No-op unless running. Never fails: errors from a tool that already
    /// exited are logged at debug level.
    pub fn close(&mut self) {
        let mut tool = match std::mem::replace(&mut self.state, ChannelState::Closed) {
            ChannelState::Running(tool) => tool,
            previous => {
                self.state = previous;
                return;
            }
        };

        let pid = tool.pid();
        tracing::info!(pid, "Killing tool process");
        if let Err(e) = tool.child.kill() {
            tracing::debug!(pid, error = %e, "Kill failed, tool already gone");
        }
        match tool.child.wait() {
            Ok(status) => tracing::debug!(pid, %status, "Tool process reaped"),
            Err(e) => tracing::debug!(pid, error = %e, "Wait failed"),
        }
        drop(tool);
    }

    /// Write `line` plus a newline to the tool and flush.
    ///
    /// Embedded newlines are not checked.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::Closed` if the tool is not running,
    /// `ChannelError::Encoding` if `line` cannot be encoded (nothing is
    /// written), or `ChannelError::Io` if the pipe is broken.
    pub fn writeline(&mut self, line: &str) -> Result<(), ChannelError> {
        let tool = self.running_mut()?;
        tracing::debug!(pid = tool.pid(), line, "<<");
        tool.stdin.write_line(line)
    }

    /// Read one line from the tool's stdout, without its trailing newline.
    ///
    /// An empty line from the tool yields `Ok("")`; an exhausted pipe yields
    /// `Err(ChannelError::EndOfStream)`. The channel stays running in both
    /// cases.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::Closed` if the tool is not running,
    /// `ChannelError::EndOfStream` at end of output, `ChannelError::Encoding`
    /// for undecodable bytes, or `ChannelError::Io` on pipe failure.
    pub fn readline(&mut self) -> Result<String, ChannelError> {
        let tool = self.running_mut()?;
        let pid = tool.pid();
        tracing::debug!(pid, "readline()");
        match tool.stdout.read_line()? {
            Some(line) => {
                tracing::debug!(pid, line = %line, ">>");
                Ok(line)
            }
            None => {
                tracing::debug!(pid, "Tool stdout reached end of stream");
                Err(ChannelError::EndOfStream)
            }
        }
    }

    /// Read one line from the tool's stderr. Same contract as
    /// [`readline`](Self::readline).
    ///
    /// # Errors
    ///
    /// See [`readline`](Self::readline).
    pub fn read_stderr_line(&mut self) -> Result<String, ChannelError> {
        let tool = self.running_mut()?;
        let pid = tool.pid();
        match tool.stderr.read_line()? {
            Some(line) => {
                tracing::debug!(pid, line = %line, "stderr >>");
                Ok(line)
            }
            None => Err(ChannelError::EndOfStream),
        }
    }

    /// Check whether the tool has exited, without blocking.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::Closed` if the tool is not running, or
    /// `ChannelError::Io` if the process state cannot be queried.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, ChannelError> {
        let tool = self.running_mut()?;
        Ok(tool.child.try_wait()?)
    }

    fn running_mut(&mut self) -> Result<&mut RunningTool, LifecycleError> {
        match &mut self.state {
            ChannelState::Running(tool) => Ok(tool),
            _ => Err(LifecycleError::Closed),
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for ProcessChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessChannel({:?}, encoding={:?}, cwd=",
            self.config.command,
            self.config.encoding.label()
        )?;
        match &self.config.working_dir {
            Some(dir) => write!(f, "{dir:?})"),
            None => f.write_str("None)"),
        }
    }
}

impl fmt::Debug for ProcessChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessChannel")
            .field("command", &self.config.command)
            .field("encoding", &self.config.encoding.label())
            .field("working_dir", &self.config.working_dir)
            .field("stdbuf", &self.config.stdbuf)
            .field("status", &self.status())
            .field("pid", &self.pid())
            .finish()
    }
}

/// Run `f` against a channel built from `config`, closing it on every exit
/// path.
///
/// The channel starts according to `config.auto_start`. A panic inside `f`
/// still kills the tool when the channel is dropped during unwinding.
///
/// # Errors
///
/// Returns the construction error converted into `E`, or whatever `f`
/// returns.
pub fn with_channel<T, E, F>(config: ChannelConfig, f: F) -> Result<T, E>
where
    F: FnOnce(&mut ProcessChannel) -> Result<T, E>,
    E: From<ChannelError>,
{
    let mut channel = ProcessChannel::new(config)?;
    let result = f(&mut channel);
    channel.close();
    result
}
