//! Session bridge: forwards a [`CodeSession`]'s snapshots into the
//! action loop.
//!
//! A [`LiveCode`] belongs to the screen that issued the code. Dropping or
//! closing it stops both the forwarding task and the session timers.

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cajero_core::{CodeSession, SessionSnapshot};

use crate::action::Action;

pub struct LiveCode {
    session: CodeSession,
    cancel: CancellationToken,
    snapshot: SessionSnapshot,
}

impl LiveCode {
    /// Start `session` on `code` and begin forwarding its snapshots.
    pub fn start(
        session: CodeSession,
        code: &str,
        amount: Option<u64>,
        action_tx: Option<UnboundedSender<Action>>,
    ) -> Self {
        session.start(code, amount);
        let cancel = CancellationToken::new();

        if let Some(tx) = action_tx {
            let mut updates = WatchStream::new(session.subscribe());
            let task_cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = task_cancel.cancelled() => break,
                        next = updates.next() => {
                            let Some(snapshot) = next else { break };
                            if tx.send(Action::SessionUpdated(snapshot)).is_err() {
                                break;
                            }
                        }
                    }
                }
                debug!("session bridge stopped");
            });
        }

        let snapshot = session.snapshot();
        Self {
            session,
            cancel,
            snapshot,
        }
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// Adopt a snapshot delivered through the action loop.
    pub fn observe(&mut self, snapshot: &SessionSnapshot) {
        self.snapshot = snapshot.clone();
    }

    pub fn toggle_visibility(&mut self) {
        self.session.toggle_visibility();
        self.snapshot = self.session.snapshot();
    }

    /// The code handed to the clipboard collaborator, if any.
    pub fn copy(&mut self) -> Option<String> {
        let code = self.session.request_copy();
        self.snapshot = self.session.snapshot();
        code
    }

    pub fn is_expired(&self) -> bool {
        self.snapshot.is_expired()
    }
}

impl Drop for LiveCode {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.session.close();
    }
}
