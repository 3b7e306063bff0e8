//! Line-oriented operator console.
//!
//! Each input line is either a scanned payload (keyboard-wedge scanners end
//! every read with Enter) or a command. A blank line dismisses the outcome
//! on display.

use crate::controller::{Phase, ScanAction, ScanState, ScanStore};
use crate::decoder::DecodeEvent;
use crate::view;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const RENDER_INTERVAL: Duration = Duration::from_millis(50);

/// One line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A payload typed or wedged in
    Scan(String),
    /// Blank line: dismiss the outcome
    Dismiss,
    /// `:reset` abandons the current scan
    Reset,
    /// `:history` prints recent scans
    History,
    /// `:quit` ends the session
    Quit,
}

impl Command {
    /// Interpret one input line
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Dismiss,
            ":reset" => Self::Reset,
            ":history" => Self::History,
            ":quit" | ":q" => Self::Quit,
            _ => Self::Scan(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

/// What the console last drew
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    phase: Phase,
    generation: u64,
    scans: usize,
    faulted: bool,
}

impl Frame {
    fn of(state: &ScanState) -> Self {
        Self {
            phase: state.phase,
            generation: state.generation,
            scans: state.history.len(),
            faulted: state.device_fault.is_some(),
        }
    }
}

/// Operator console bound to a store and the decoder input it feeds
pub struct Console {
    store: ScanStore,
    scanner: mpsc::Sender<DecodeEvent>,
}

impl Console {
    /// Console feeding payloads into `scanner` and actions into `store`
    #[must_use]
    pub const fn new(store: ScanStore, scanner: mpsc::Sender<DecodeEvent>) -> Self {
        Self { store, scanner }
    }

    /// Serve the operator until `:quit` or end of input
    ///
    /// # Errors
    ///
    /// Returns any I/O error from reading `input` or writing `output`.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut last: Option<Frame> = None;

        loop {
            self.render(&mut output, &mut last).await?;

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("Console input closed");
                        return Ok(());
                    };
                    if !self.handle(Command::parse(&line), &mut output).await? {
                        return Ok(());
                    }
                },
                () = tokio::time::sleep(RENDER_INTERVAL) => {},
            }
        }
    }

    /// Returns `false` when the session should end
    async fn handle<W>(&self, command: Command, output: &mut W) -> std::io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Quit => return Ok(false),
            Command::Dismiss => {
                if self.store.state(|s| s.phase).await == Phase::Showing {
                    self.send(ScanAction::Dismiss).await;
                }
            },
            Command::Reset => self.send(ScanAction::ForceReset).await,
            Command::History => {
                let text = self.store.state(|s| view::render_history(&s.history)).await;
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
            },
            Command::Scan(payload) => {
                if let Err(error) = self.scanner.try_send(DecodeEvent::Payload(payload)) {
                    tracing::warn!(%error, "Scanner input dropped");
                }
            },
        }
        Ok(true)
    }

    async fn send(&self, action: ScanAction) {
        if let Err(error) = self.store.send(action).await {
            tracing::debug!(%error, "Console action rejected");
        }
    }

    async fn render<W>(&self, output: &mut W, last: &mut Option<Frame>) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let (frame, text) = self
            .store
            .state(|s| {
                let frame = Frame::of(s);
                let mut text = String::new();
                if let (Phase::Showing, Some(outcome)) = (s.phase, &s.outcome) {
                    text.push('\n');
                    text.push_str(&view::render_outcome(outcome));
                }
                text.push_str(&view::render_phase(s));
                text.push('\n');
                (frame, text)
            })
            .await;

        if last.as_ref() == Some(&frame) {
            return Ok(());
        }
        *last = Some(frame);

        output.write_all(text.as_bytes()).await?;
        output.flush().await
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(""), Command::Dismiss);
        assert_eq!(Command::parse("  \r"), Command::Dismiss);
        assert_eq!(Command::parse(":reset"), Command::Reset);
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(
            Command::parse("686b52a51f85f2ba7bf56f36\r"),
            Command::Scan("686b52a51f85f2ba7bf56f36".to_string())
        );
    }

    #[test]
    fn payload_whitespace_is_kept_for_the_extractor() {
        assert_eq!(
            Command::parse("  {\"bookingId\": \"x\"} "),
            Command::Scan("  {\"bookingId\": \"x\"} ".to_string())
        );
    }
}
