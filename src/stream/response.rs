//! Generation stream implementation.
//!
//! This module provides [`GenerationStream`], which implements
//! [`futures::Stream`] to yield [`GenerationPart`]s from an agent process,
//! and [`GenerationResponse`], the folded form used by non-streaming calls.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::process::{AgentProcess, LineSource, StderrTail};
use crate::protocol::{AgentEvent, Audience, Usage};
use crate::stream::parts::{FinishReason, GenerationPart};
use crate::stream::translator::Translator;
use crate::{Error, Invocation, Result};

/// A stream of [`GenerationPart`]s from one agent call.
///
/// The stream is lazy, ordered, and non-restartable, and is terminated by
/// exactly one [`Finish`](GenerationPart::Finish) or
/// [`Error`](GenerationPart::Error) part.
///
/// # Cancellation
///
/// The cancellation token passed at spawn time is honored for the whole
/// process lifetime. Dropping the stream aborts the background drive task,
/// which kills the subprocess.
///
/// # Example
///
/// ```ignore
/// use futures::StreamExt;
/// use libgoose::GenerationPart;
///
/// let mut stream = client.stream(request).await?;
/// while let Some(part) = stream.next().await {
///     match part {
///         GenerationPart::TextDelta { text, .. } => print!("{}", text),
///         GenerationPart::Finish { usage, .. } => {
///             println!("\n[{} tokens]", usage.total());
///         }
///         GenerationPart::Error(err) => eprintln!("failed: {}", err),
///         _ => {}
///     }
/// }
/// ```
pub struct GenerationStream {
    rx: mpsc::Receiver<GenerationPart>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl GenerationStream {
    /// Start driving a spawned agent process.
    ///
    /// The timeout is armed immediately; the token is watched for the whole
    /// process lifetime.
    pub(crate) fn drive_process(
        process: AgentProcess,
        audience: Audience,
        timeout: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let translator = Translator::new(audience);
        let task = tokio::spawn(drive(process, translator, timeout, cancellation, tx));
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Build a stream over an arbitrary line source.
    ///
    /// No process is supervised: there is no timeout or cancellation, and
    /// read failures classify as a process error with unknown exit code.
    /// This is the replay/testing entry point.
    pub fn from_lines<L>(lines: L, audience: Audience) -> Self
    where
        L: LineSource + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let translator = Translator::new(audience);
        let invocation = Invocation::new(crate::config::DEFAULT_BINARY, Vec::new());
        let task = tokio::spawn(drive_lines(lines, translator, invocation, tx));
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Collect the stream into an aggregate response.
    ///
    /// A terminal `Error` part rejects with its error; otherwise all text is
    /// folded into one string alongside the finish reason and usage.
    pub async fn collect_all(mut self) -> Result<GenerationResponse> {
        use futures::StreamExt;

        let mut response = GenerationResponse::default();
        while let Some(part) = self.next().await {
            match &part {
                GenerationPart::TextDelta { text, .. } => response.text.push_str(text),
                GenerationPart::Finish { reason, usage } => {
                    response.finish_reason = *reason;
                    response.usage = usage.clone();
                }
                GenerationPart::Error(err) => return Err(err.clone()),
                _ => {}
            }
            response.parts.push(part);
        }
        Ok(response)
    }

    /// Collect only the concatenated text.
    pub async fn collect_text(self) -> Result<String> {
        Ok(self.collect_all().await?.text)
    }
}

impl Stream for GenerationStream {
    type Item = GenerationPart;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for GenerationStream {
    fn drop(&mut self) {
        // The drive task owns the process; aborting it drops the process,
        // whose Drop kills the child if it is still running.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The folded result of a non-streaming call.
#[derive(Debug, Clone, Default)]
pub struct GenerationResponse {
    /// All text content concatenated.
    pub text: String,
    /// Canonicalized finish reason.
    pub finish_reason: FinishReason,
    /// Token counts reported by the agent.
    pub usage: Usage,
    /// Every part, in emission order.
    pub parts: Vec<GenerationPart>,
}

impl GenerationResponse {
    /// The tool calls requested during the run, in order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &GenerationPart> {
        self.parts
            .iter()
            .filter(|p| matches!(p, GenerationPart::ToolCall { .. }))
    }
}

/// Outcome of feeding one raw line through decode + translate.
enum LineStep {
    /// Parts to forward (possibly empty for skipped/ignored lines).
    Parts(Vec<GenerationPart>),
    /// The agent reported an error; the call must terminate.
    Upstream(String),
}

fn translate_line(translator: &mut Translator, line: &str) -> LineStep {
    match AgentEvent::decode(line) {
        None => LineStep::Parts(Vec::new()),
        Some(AgentEvent::Error(err)) => LineStep::Upstream(err.message),
        Some(event) => LineStep::Parts(translator.on_event(event)),
    }
}

/// Drive one supervised agent process to completion.
///
/// This is the single exit funnel required by the lifecycle contract: every
/// path (success, timeout, abort, decode failure, process failure) shuts the
/// process down before the terminal part is sent, and the translator
/// guarantees exactly one terminator goes out.
async fn drive(
    mut process: AgentProcess,
    mut translator: Translator,
    timeout: Duration,
    cancellation: CancellationToken,
    tx: mpsc::Sender<GenerationPart>,
) {
    let invocation = process.invocation().clone();
    let mut lines = process.take_stdout().expect("stdout was configured");
    let mut stderr = process.take_stderr();

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    // Phase 1: consume stdout until EOF, racing cancellation and timeout.
    let outcome: Result<()> = loop {
        tokio::select! {
            () = cancellation.cancelled() => {
                process.shutdown().await;
                break Err(Error::aborted(invocation.clone()));
            }
            () = &mut deadline => {
                process.shutdown().await;
                break Err(Error::timeout(invocation.clone(), timeout));
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match translate_line(&mut translator, &line) {
                    LineStep::Parts(parts) => {
                        if forward(&tx, parts).await.is_err() {
                            process.shutdown().await;
                            return;
                        }
                    }
                    LineStep::Upstream(message) => {
                        process.shutdown().await;
                        break Err(Error::upstream(invocation.clone(), message));
                    }
                },
                Ok(None) => break Ok(()),
                Err(err) => {
                    tracing::debug!(error = %err, "agent stdout read failed");
                    let status = process.shutdown().await;
                    let exit_code = status.and_then(|s| s.code()).unwrap_or(-1);
                    let tail = collect_tail(&mut stderr).await;
                    break Err(Error::process(invocation.clone(), exit_code, tail));
                }
            }
        }
    };

    let error = match outcome {
        Err(error) => Some(error),
        Ok(()) => {
            // Phase 2: stdout is exhausted; reap the process, still racing
            // cancellation and the original deadline.
            let waited = tokio::select! {
                () = cancellation.cancelled() => WaitOutcome::Cancelled,
                () = &mut deadline => WaitOutcome::Deadline,
                status = process.wait() => WaitOutcome::Exited(status),
            };

            match waited {
                WaitOutcome::Cancelled => {
                    process.shutdown().await;
                    Some(Error::aborted(invocation.clone()))
                }
                WaitOutcome::Deadline => {
                    process.shutdown().await;
                    Some(Error::timeout(invocation.clone(), timeout))
                }
                WaitOutcome::Exited(Ok(status)) if status.success() => {
                    if !translator.is_finished() {
                        let _ = forward(&tx, translator.finish_eof()).await;
                    }
                    None
                }
                WaitOutcome::Exited(Ok(status)) => {
                    let exit_code = status.code().unwrap_or(-1);
                    let tail = collect_tail(&mut stderr).await;
                    Some(Error::process(invocation.clone(), exit_code, tail))
                }
                WaitOutcome::Exited(Err(err)) => {
                    tracing::debug!(error = %err, "wait for agent exit failed");
                    let tail = collect_tail(&mut stderr).await;
                    Some(Error::process(invocation.clone(), -1, tail))
                }
            }
        }
    };

    if let Some(error) = error {
        let _ = forward(&tx, translator.fail(error)).await;
    }
}

/// How the post-EOF wait for process exit resolved.
enum WaitOutcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    Deadline,
}

/// Drive a bare line source (no process, no timers) to completion.
async fn drive_lines<L: LineSource>(
    mut lines: L,
    mut translator: Translator,
    invocation: Invocation,
    tx: mpsc::Sender<GenerationPart>,
) {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match translate_line(&mut translator, &line) {
                LineStep::Parts(parts) => {
                    if forward(&tx, parts).await.is_err() {
                        return;
                    }
                }
                LineStep::Upstream(message) => {
                    let error = Error::upstream(invocation, message);
                    let _ = forward(&tx, translator.fail(error)).await;
                    return;
                }
            },
            Ok(None) => {
                if !translator.is_finished() {
                    let _ = forward(&tx, translator.finish_eof()).await;
                }
                return;
            }
            Err(err) => {
                let error = Error::process(invocation, -1, err.to_string());
                let _ = forward(&tx, translator.fail(error)).await;
                return;
            }
        }
    }
}

/// Send parts in order; errors mean the receiver is gone.
async fn forward(
    tx: &mpsc::Sender<GenerationPart>,
    parts: Vec<GenerationPart>,
) -> std::result::Result<(), ()> {
    for part in parts {
        if tx.send(part).await.is_err() {
            return Err(());
        }
    }
    Ok(())
}

async fn collect_tail(stderr: &mut Option<StderrTail>) -> String {
    match stderr.take() {
        Some(tail) => tail.collect().await,
        None => String::new(),
    }
}
