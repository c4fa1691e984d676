//! # Development Reload Listener
//!
//! Development servers restart themselves when code changes and announce it
//! on a server-sent-events endpoint. This module subscribes to that stream
//! and tells the embedding application when to refresh, playing the role
//! the `EventSource` script plays in a browser.
//!
//! The listener is development tooling: it shares the [`ClientConfig`] but
//! nothing else with the ceremony machinery, and leaving it out of a build
//! changes nothing about ceremonies.
//!
//! ## Stream Contract
//! - `start`: the server just came up; after a reconnect this means new
//!   code is running
//! - `heartbeat`: periodic liveness ping, logged and dropped
//! - connection loss: reconnect with a growing delay, give up after too
//!   many consecutive failures

use std::time::Duration;

use futures::StreamExt;
use reqwest::header;
use tokio::sync::mpsc;

use crate::config::ClientConfig;

/// Pause between the server's start announcement and the reload signal,
/// giving the freshly restarted server time to finish binding.
pub const RELOAD_DELAY: Duration = Duration::from_secs(1);

// Reconnect delay grows by one step per consecutive failure
const BACKOFF_STEP: Duration = Duration::from_secs(1);

// Consecutive failed connections tolerated before the listener gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 20;

/// Signal delivered to the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The server restarted; refresh whatever was built on top of it
    Reload,
}

/// Subscriber for the server's reload event stream.
pub struct ReloadListener {
    http: reqwest::Client,
    url: String,
}

impl ReloadListener {
    pub fn new(config: &ClientConfig) -> Self {
        ReloadListener { http: reqwest::Client::new(), url: config.reload_url() }
    }

    /// Spawn the listener onto the current runtime and hand back the
    /// receiving end. The task winds down when the receiver is dropped or
    /// the failure cap is reached.
    pub fn spawn(self) -> mpsc::Receiver<ReloadEvent> {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(self.run(tx));
        rx
    }

    /// Subscription loop: connect, consume the stream, reconnect on loss.
    pub async fn run(self, tx: mpsc::Sender<ReloadEvent>) {
        let mut failures: u32 = 0;
        loop {
            match self.listen(&tx, &mut failures).await {
                // The server closed the stream, usually because it is
                // restarting; treat it like a lost connection minus the blame
                Ok(()) => {}
                Err(err) => {
                    failures += 1;
                    if failures > MAX_CONSECUTIVE_FAILURES {
                        tracing::warn!(error = %err, "reload stream kept failing, giving up");
                        return;
                    }
                    tracing::debug!(error = %err, failures, "reload stream lost, will reconnect");
                }
            }

            if tx.is_closed() {
                return;
            }

            tokio::time::sleep(retry_delay(failures)).await;
        }
    }

    async fn listen(
        &self,
        tx: &mpsc::Sender<ReloadEvent>,
        failures: &mut u32,
    ) -> Result<(), reqwest::Error> {
        let response = self
            .http
            .get(&self.url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        // Connected; the failure streak is over
        *failures = 0;
        tracing::info!(url = %self.url, "reload stream connected");

        let mut parser = FrameParser::default();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            for frame in parser.push(&chunk?) {
                if !self.dispatch(frame, tx).await {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// React to one event. Returns `false` once the receiver is gone and
    /// listening has no audience left.
    async fn dispatch(&self, frame: Frame, tx: &mpsc::Sender<ReloadEvent>) -> bool {
        match frame.event.as_str() {
            "start" => {
                tracing::debug!(data = %frame.data, "server announced a start");
                tokio::time::sleep(RELOAD_DELAY).await;
                tx.send(ReloadEvent::Reload).await.is_ok()
            }
            "heartbeat" => {
                tracing::debug!("reload heartbeat");
                !tx.is_closed()
            }
            other => {
                tracing::trace!(event = other, "ignoring reload event");
                !tx.is_closed()
            }
        }
    }
}

// Delay before reconnect attempt number `failures + 1`. The schedule is
// the browser client's: 1s after a clean close, one second more per
// consecutive failure.
fn retry_delay(failures: u32) -> Duration {
    BACKOFF_STEP + BACKOFF_STEP * failures
}

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    event: String,
    data: String,
}

/// Incremental parser for the `text/event-stream` framing.
///
/// Frames are `field: value` lines closed by a blank line; chunks may cut
/// lines anywhere, so bytes are buffered until a full line is available.
/// Only the `event` and `data` fields matter here, comments and the rest
/// of the field set are skipped.
#[derive(Debug, Default)]
struct FrameParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl FrameParser {
    /// Feed one chunk of body bytes, get every frame it completed.
    fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(line) = self.take_line() {
            if let Some(frame) = self.feed_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    // Pop one complete line off the buffer, terminator removed.
    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn feed_line(&mut self, line: &str) -> Option<Frame> {
        // Blank line closes the pending frame
        if line.is_empty() {
            return self.finish_frame();
        }

        // A leading colon marks a comment, used for keep-alive padding
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id, retry and anything else are irrelevant to reloading
            _ => {}
        }
        None
    }

    fn finish_frame(&mut self) -> Option<Frame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        Some(Frame {
            // The format's default event type when no `event:` line was seen
            event: self.event.take().unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(parser: &mut FrameParser, input: &str) -> Vec<Frame> {
        parser.push(input.as_bytes())
    }

    // ---- framing ----

    #[test]
    fn parses_a_whole_frame() {
        let mut parser = FrameParser::default();
        let parsed = frames(&mut parser, "event: start\ndata: server started\n\n");
        assert_eq!(
            parsed,
            vec![Frame { event: "start".to_string(), data: "server started".to_string() }]
        );
    }

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let mut parser = FrameParser::default();
        assert!(frames(&mut parser, "event: st").is_empty());
        assert!(frames(&mut parser, "art\ndata: server ").is_empty());
        let parsed = frames(&mut parser, "started\n\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].event, "start");
        assert_eq!(parsed[0].data, "server started");
    }

    #[test]
    fn handles_crlf_terminators() {
        let mut parser = FrameParser::default();
        let parsed = frames(&mut parser, "event: heartbeat\r\ndata: ping\r\n\r\n");
        assert_eq!(parsed[0].event, "heartbeat");
        assert_eq!(parsed[0].data, "ping");
    }

    #[test]
    fn several_frames_in_one_chunk() {
        let mut parser = FrameParser::default();
        let parsed = frames(
            &mut parser,
            "event: heartbeat\ndata: ping\n\nevent: start\ndata: server started\n\n",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].event, "heartbeat");
        assert_eq!(parsed[1].event, "start");
    }

    #[test]
    fn event_type_defaults_to_message() {
        let mut parser = FrameParser::default();
        let parsed = frames(&mut parser, "data: hello\n\n");
        assert_eq!(parsed[0].event, "message");
    }

    #[test]
    fn comments_and_blank_runs_produce_nothing() {
        let mut parser = FrameParser::default();
        assert!(frames(&mut parser, ": keep-alive\n\n\n\n").is_empty());
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut parser = FrameParser::default();
        let parsed = frames(&mut parser, "data: one\ndata: two\n\n");
        assert_eq!(parsed[0].data, "one\ntwo");
    }

    #[test]
    fn value_keeps_extra_leading_spaces_beyond_the_first() {
        let mut parser = FrameParser::default();
        let parsed = frames(&mut parser, "data:  padded\n\n");
        assert_eq!(parsed[0].data, " padded");
    }

    // ---- retry schedule ----

    #[test]
    fn retry_delay_matches_the_browser_schedule() {
        assert_eq!(retry_delay(0), Duration::from_secs(1));
        assert_eq!(retry_delay(1), Duration::from_secs(2));
        assert_eq!(retry_delay(5), Duration::from_secs(6));
        assert_eq!(retry_delay(20), Duration::from_secs(21));
    }
}
