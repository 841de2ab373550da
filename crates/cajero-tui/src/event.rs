//! Crossterm event reader running in a background tokio task.
//!
//! Produces key and resize events plus tick/render events at fixed
//! intervals over an unbounded `mpsc` channel.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal was resized to (cols, rows).
    Resize(u16, u16),
    /// Animation tick (throbbers, toast expiry).
    Tick,
    Render,
}

/// Reads terminal events in a background task and sends them over a channel.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    pub fn new(tick_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut stream = EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);
            let mut render = tokio::time::interval(render_rate);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            render.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = tick.tick() => Event::Tick,
                    _ = render.tick() => Event::Render,
                    Some(Ok(ev)) = stream.next() => match ev {
                        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                        CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                        _ => continue,
                    },
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
