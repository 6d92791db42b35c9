//! I/O primitives for consuming the agent subprocess streams.

use std::collections::VecDeque;
use std::future::Future;
use std::io;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;

use super::STDERR_TAIL_BYTES;

/// A source of raw output lines.
///
/// This is the seam between the subprocess and the decode/translate
/// pipeline: production code reads a child's stdout through
/// [`ProcessLineReader`], tests inject canned lines.
///
/// The sequence is lazy, finite, and non-restartable: `Ok(None)` marks the
/// end of the stream and every later call must return `Ok(None)` as well.
pub trait LineSource: Send {
    /// Read the next line, without its trailing newline.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn next_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;
}

/// Reads newline-delimited lines from the agent's stdout.
///
/// Incomplete tail fragments are buffered across reads; a final line without
/// a trailing newline is still yielded when the stream closes.
pub struct ProcessLineReader {
    reader: BufReader<ChildStdout>,
    buffer: String,
}

impl ProcessLineReader {
    /// Create a new reader from a child process stdout.
    pub fn new(stdout: ChildStdout) -> Self {
        Self {
            reader: BufReader::new(stdout),
            buffer: String::with_capacity(4096),
        }
    }
}

impl LineSource for ProcessLineReader {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            self.buffer.clear();

            let bytes_read = self.reader.read_line(&mut self.buffer).await?;
            if bytes_read == 0 {
                return Ok(None);
            }

            let line = self.buffer.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            return Ok(Some(line.to_string()));
        }
    }
}

/// Collects the tail of the agent's stderr in the background.
///
/// Stderr is drained continuously so the subprocess never blocks on a full
/// pipe; only the last [`STDERR_TAIL_BYTES`] are kept for error reports.
pub struct StderrTail {
    handle: JoinHandle<String>,
}

impl StderrTail {
    /// Start draining the given stderr stream.
    pub fn spawn(stderr: ChildStderr) -> Self {
        let handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut lines: VecDeque<String> = VecDeque::new();
            let mut total = 0usize;

            loop {
                let mut line = String::new();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        total += line.len();
                        lines.push_back(line);
                        while total > STDERR_TAIL_BYTES {
                            match lines.pop_front() {
                                Some(dropped) => total -= dropped.len(),
                                None => break,
                            }
                        }
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "stderr read failed");
                        break;
                    }
                }
            }

            let mut tail = String::with_capacity(total);
            for line in lines {
                tail.push_str(&line);
            }
            tail
        });

        Self { handle }
    }

    /// Wait for the stream to close and return the captured tail.
    ///
    /// The tail is trimmed of trailing whitespace. Call this only after the
    /// process has been terminated, otherwise it blocks until the agent
    /// closes its stderr.
    pub async fn collect(self) -> String {
        match self.handle.await {
            Ok(tail) => tail.trim_end().to_string(),
            Err(err) => {
                tracing::debug!(error = %err, "stderr drain task failed");
                String::new()
            }
        }
    }
}
