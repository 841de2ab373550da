// ── Session timer driver ──
//
// Owns a `WithdrawalCodeSession` plus the two timers that feed it: the
// 1-second countdown and the 2-second copy acknowledgement. Each timer is
// an owned `JoinHandle` + `CancellationToken`; `close()` and `Drop` stop
// both. Snapshots go out on a `watch` channel after every change, sent
// while the session lock is still held.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{COPY_ACK, Epoch, SessionSnapshot, WithdrawalCodeSession};

const TICK: Duration = Duration::from_secs(1);

/// One spawned timer.
struct Timer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Timer {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Shared between the driver and its timer tasks.
#[derive(Clone)]
struct Shared {
    session: Arc<Mutex<WithdrawalCodeSession>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WithdrawalCodeSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the session and publish the result before the lock is
    /// released, so a racing timer can never publish over a newer state.
    fn update<T>(&self, f: impl FnOnce(&mut WithdrawalCodeSession) -> Option<T>) -> Option<T> {
        let mut session = self.lock();
        let out = f(&mut session)?;
        self.updates.send_replace(session.snapshot());
        Some(out)
    }
}

/// A withdrawal code session with live timers.
///
/// Must be used from inside a tokio runtime: `start` and `request_copy`
/// spawn tasks.
pub struct CodeSession {
    shared: Shared,
    countdown: Mutex<Option<Timer>>,
    copy_ack: Mutex<Option<Timer>>,
}

impl CodeSession {
    pub fn new(validity: Duration) -> Self {
        let session = WithdrawalCodeSession::new(validity);
        let (tx, _) = watch::channel(session.snapshot());
        Self {
            shared: Shared {
                session: Arc::new(Mutex::new(session)),
                updates: Arc::new(tx),
            },
            countdown: Mutex::new(None),
            copy_ack: Mutex::new(None),
        }
    }

    /// Receive a snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().snapshot()
    }

    /// Track a new code and restart the countdown. Empty codes are ignored.
    pub fn start(&self, code: impl Into<String>, amount: Option<u64>) {
        let Some(epoch) = self.shared.update(|session| session.start(code, amount)) else {
            return;
        };

        stop_slot(&self.countdown);
        stop_slot(&self.copy_ack);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(countdown_task(self.shared.clone(), epoch, cancel.clone()));
        replace_slot(&self.countdown, Timer { cancel, handle });
    }

    pub fn toggle_visibility(&self) {
        self.shared.update(|session| {
            session.toggle_visibility();
            Some(())
        });
    }

    /// Raw code for the caller's clipboard. Raises the copied flag for two
    /// seconds; a repeat copy restarts that window.
    pub fn request_copy(&self) -> Option<String> {
        let (value, epoch) = self.shared.update(|session| {
            let value = session.request_copy()?;
            Some((value, session.current_epoch()))
        })?;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(copy_ack_task(self.shared.clone(), epoch, cancel.clone()));
        replace_slot(&self.copy_ack, Timer { cancel, handle });
        Some(value)
    }

    /// Stop both timers and forget the code. Idempotent.
    pub fn close(&self) {
        stop_slot(&self.countdown);
        stop_slot(&self.copy_ack);
        self.shared.update(|session| {
            session.close();
            Some(())
        });
    }
}

impl Default for CodeSession {
    fn default() -> Self {
        Self::new(super::DEFAULT_VALIDITY)
    }
}

impl Drop for CodeSession {
    fn drop(&mut self) {
        for slot in [&mut self.countdown, &mut self.copy_ack] {
            if let Some(timer) = slot.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
                timer.stop();
            }
        }
    }
}

fn stop_slot(slot: &Mutex<Option<Timer>>) {
    let timer = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(timer) = timer {
        timer.stop();
    }
}

fn replace_slot(slot: &Mutex<Option<Timer>>, timer: Timer) {
    let previous = slot
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(timer);
    if let Some(previous) = previous {
        previous.stop();
    }
}

// ── Timer tasks ──────────────────────────────────────────────────

async fn countdown_task(shared: Shared, epoch: Epoch, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(TICK);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let expired = shared.update(|session| {
                    session.tick_at(epoch).then(|| session.remaining_secs() == 0)
                });
                if expired != Some(false) {
                    break;
                }
            }
        }
    }
    debug!("countdown stopped");
}

async fn copy_ack_task(shared: Shared, epoch: Epoch, cancel: CancellationToken) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(COPY_ACK) => {
            shared.update(|session| session.clear_copied(epoch).then_some(()));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    async fn wait(secs: f64) {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_follows_the_clock() {
        let driver = CodeSession::default();
        driver.start("482913", Some(50_000));
        wait(3.5).await;
        let snap = driver.snapshot();
        assert_eq!(snap.remaining_secs, 1800 - 3);
        assert_eq!(snap.state, SessionState::Active);
        assert_eq!(snap.remaining_formatted(), "29:57");
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_stops_at_zero() {
        let driver = CodeSession::new(Duration::from_secs(2));
        driver.start("1", None);
        wait(10.5).await;
        let snap = driver.snapshot();
        assert_eq!(snap.remaining_secs, 0);
        assert_eq!(snap.state, SessionState::Expired);
        assert_eq!(snap.code.as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn copied_flag_clears_after_two_seconds() {
        let driver = CodeSession::default();
        driver.start("482913", None);
        assert_eq!(driver.request_copy().as_deref(), Some("482913"));
        assert!(driver.snapshot().copied);
        wait(1.5).await;
        assert!(driver.snapshot().copied);
        wait(1.0).await;
        assert!(!driver.snapshot().copied);
        // Independent of the countdown.
        assert_eq!(driver.snapshot().remaining_secs, 1800 - 2);
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_everything() {
        let driver = CodeSession::default();
        driver.start("482913", None);
        driver.request_copy();
        wait(1.5).await;
        driver.close();
        driver.close();
        wait(5.0).await;
        let snap = driver.snapshot();
        assert_eq!(snap.state, SessionState::Idle);
        assert_eq!(snap.code, None);
        assert_eq!(snap.remaining_secs, 0);
        assert!(!snap.copied);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_leaves_only_the_second_code() {
        let driver = CodeSession::default();
        driver.start("123456", Some(50_000));
        wait(5.5).await;
        driver.start("654321", Some(20_000));
        wait(2.5).await;
        let snap = driver.snapshot();
        assert_eq!(snap.code.as_deref(), Some("654321"));
        assert_eq!(snap.amount, Some(20_000));
        // Only the new countdown is ticking.
        assert_eq!(snap.remaining_secs, 1800 - 2);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_tick() {
        let driver = CodeSession::default();
        let mut rx = driver.subscribe();
        driver.start("482913", None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().remaining_secs, 1800);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().remaining_secs, 1799);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_start_keeps_running_session() {
        let driver = CodeSession::default();
        driver.start("482913", None);
        wait(1.5).await;
        driver.start("", None);
        wait(1.0).await;
        assert_eq!(driver.snapshot().remaining_secs, 1800 - 2);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_end_on_idle_after_close() {
        let driver = CodeSession::default();
        let mut rx = driver.subscribe();
        driver.start("482913", None);
        wait(2.5).await;
        driver.close();
        wait(3.0).await;
        let last = rx.borrow_and_update().clone();
        assert_eq!(last.state, SessionState::Idle);
        assert_eq!(last.code, None);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_never_see_a_superseded_code() {
        let driver = CodeSession::default();
        let mut rx = driver.subscribe();
        driver.start("123456", None);
        wait(1.5).await;
        driver.start("654321", None);
        wait(3.0).await;
        assert_eq!(rx.borrow_and_update().code.as_deref(), Some("654321"));
        assert_eq!(driver.snapshot().code.as_deref(), Some("654321"));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_timers() {
        let driver = CodeSession::default();
        let rx = driver.subscribe();
        driver.start("482913", None);
        drop(driver);
        wait(3.0).await;
        assert_eq!(rx.borrow().remaining_secs, 1800);
    }
}
