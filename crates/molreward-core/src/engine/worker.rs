use super::config::{OracleConfig, WorkerCommand};
use super::protocol;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One member of a dispatcher pool.
///
/// A worker serves a single request at a time. `call` never fails: protocol
/// anomalies, timeouts and unparsable descriptors all degrade to `0.0`, and a
/// worker that can no longer serve requests reports so through `is_alive`.
pub trait Worker: Send + 'static {
    fn slot(&self) -> usize;

    fn call(&mut self, descriptor: &str) -> f64;

    fn is_alive(&mut self) -> bool;
}

/// A worker backed by a long-lived scoring subprocess.
///
/// The subprocess receives its oracle name and overrides on the command line and
/// then answers one response line per request line on stdout. A dedicated reader
/// thread forwards stdout lines over a channel so that reads can time out.
pub struct ProcessWorker {
    slot: usize,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
    timeout: Duration,
}

impl ProcessWorker {
    /// Spawns `program args.. <oracle> -S key=value..` for the given oracle.
    pub fn spawn(
        slot: usize,
        command: &WorkerCommand,
        oracle: &OracleConfig,
        timeout: Duration,
    ) -> io::Result<Self> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).arg(oracle.kind().name());
        for (key, value) in oracle.to_overrides() {
            cmd.arg("-S").arg(format!("{key}={value}"));
        }
        Self::from_command(slot, cmd, timeout)
    }

    /// Starts an arbitrary command speaking the worker line protocol.
    pub fn from_command(slot: usize, mut cmd: Command, timeout: Duration) -> io::Result<Self> {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::other("failed to capture worker stdio"));
            }
        };

        let (tx, lines) = mpsc::channel();
        let reader = thread::Builder::new()
            .name(format!("worker-{slot}-stdout"))
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = reader {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        info!(slot, pid = child.id(), "Spawned worker process");
        Ok(Self {
            slot,
            child,
            stdin: BufWriter::new(stdin),
            lines,
            timeout,
        })
    }

    fn send(&mut self, descriptor: &str) -> io::Result<()> {
        writeln!(self.stdin, "{descriptor}")?;
        self.stdin.flush()
    }
}

impl Worker for ProcessWorker {
    fn slot(&self) -> usize {
        self.slot
    }

    fn call(&mut self, descriptor: &str) -> f64 {
        if !protocol::is_sendable(descriptor) {
            warn!(slot = self.slot, "Descriptor contains a line break; scoring 0.0");
            return 0.0;
        }

        // Late answers to requests that already timed out.
        let stale = self.lines.try_iter().count();
        if stale > 0 {
            debug!(slot = self.slot, stale, "Discarded stale response lines");
        }

        if let Err(e) = self.send(descriptor) {
            warn!(slot = self.slot, error = %e, "Failed to send request to worker");
            return 0.0;
        }

        match self.lines.recv_timeout(self.timeout) {
            Ok(line) => match protocol::parse_response(descriptor, &line) {
                Ok(response) => response.score(),
                Err(e) => {
                    warn!(slot = self.slot, error = %e, "Protocol violation; scoring 0.0");
                    0.0
                }
            },
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    slot = self.slot,
                    timeout_ms = self.timeout.as_millis() as u64,
                    descriptor,
                    "Worker response timed out; scoring 0.0"
                );
                0.0
            }
            Err(RecvTimeoutError::Disconnected) => {
                debug!(slot = self.slot, "Worker stdout closed");
                0.0
            }
        }
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for ProcessWorker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        debug!(slot = self.slot, "Worker process terminated");
    }
}
